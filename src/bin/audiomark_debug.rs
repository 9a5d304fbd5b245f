//! Manual smoke-test harness for local development. Not the product's CLI
//! surface (out of scope per spec §1) and carries no stability contract.
//!
//! Usage: `audiomark-debug <path>`

use audiomark::AudioMarkerEngine;

fn main()
{
    tracing_subscriber::fmt::init();

    let mut args = std::env::args();
    let program = args.next().unwrap_or_else(|| "audiomark-debug".to_string());
    let Some(path) = args.next()
    else
    {
        eprintln!("usage: {program} <path>");
        std::process::exit(2);
    };

    let engine = AudioMarkerEngine::new();
    match engine.read(&path)
    {
        | Ok(info) =>
        {
            println!("{:#?}", info.metadata);
            println!("{} chapter(s)", info.chapters.len());
            for (i, chapter) in info.chapters.iter().enumerate()
            {
                println!("  [{i}] {} @ {}", chapter.title_or_synthesized(i), chapter.start);
            }
        }
        | Err(err) =>
        {
            eprintln!("failed to read {path}: {err}");
            std::process::exit(1);
        }
    }
}
