//! CLI smoke entry point.
//!
//! # Responsibility
//! - Verify `moveplay_core` wiring against the in-process Runtime.
//! - Keep output deterministic for quick local sanity checks.

use log::warn;
use moveplay_core::{
    CanonicalDir, MemoryRuntime, Playground, ProjectFacade, RuntimeError, SetupOptions,
};
use std::error::Error;
use std::sync::Arc;

const DEMO_PROJECT: &str = "demo";
const DEMO_MODULE: &str = "module 0x1::demo {\n    public fun answer(): u64 { 42 }\n}\n";

#[tokio::main(flavor = "current_thread")]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("moveplay_cli failed: {err}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn Error>> {
    let runtime = Arc::new(MemoryRuntime::new());
    runtime.on_run(|_, command| match command.trim() {
        "demo::answer()" => Ok("42".to_string()),
        other => Err(RuntimeError::new(format!("unknown script `{other}`"))),
    });

    let options = SetupOptions::from_env()
        .on_event(|event| println!("event {}: {}", event.kind, event.message));
    let playground = Playground::setup(runtime, options).await?;
    println!("moveplay version={}", playground.version().await);

    let mut project = playground.open_project(DEMO_PROJECT).await?;
    let module = project.open_module("demo/demo.move").await?;
    project.set_content(&module, DEMO_MODULE).await?;
    project.open_script("main.move").await?;
    project.open_test("demo_tests.move").await?;

    print_layout(&mut project).await?;

    project.build().await?;
    match project.run_script("demo::answer()").await {
        Ok(output) => println!("run demo::answer() -> {output}"),
        Err(err) => warn!("event=cli_run module=cli status=error error={err}"),
    }
    Ok(())
}

async fn print_layout(project: &mut ProjectFacade) -> Result<(), Box<dyn Error>> {
    println!("project {} id={}", project.name(), project.id());
    for kind in CanonicalDir::ALL {
        let dir = project.canonical_dir(kind).await?;
        for path in dir.file_paths() {
            println!("  {}/{path}", kind.dir_name());
        }
    }
    Ok(())
}
