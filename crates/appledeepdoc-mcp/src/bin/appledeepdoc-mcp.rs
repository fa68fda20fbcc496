use std::env;
use std::path::PathBuf;

use appledeepdoc::DocDiscovery;
use appledeepdoc_mcp::{init_tracing, run_stdio_server_with_discovery};

#[tokio::main]
async fn main() {
    init_tracing();

    let mut args = env::args().skip(1);
    let mut docs_path: Option<PathBuf> = None;

    while let Some(arg) = args.next() {
        if let Some(path) = arg.strip_prefix("--docs-path=") {
            docs_path = Some(PathBuf::from(path));
        } else if arg == "--docs-path" {
            match args.next() {
                Some(path) => docs_path = Some(PathBuf::from(path)),
                None => {
                    eprintln!("--docs-path requires a path argument");
                    std::process::exit(1);
                }
            }
        } else {
            eprintln!("unknown argument: {arg}");
            std::process::exit(1);
        }
    }

    let discovery = match docs_path {
        Some(path) => DocDiscovery::with_override(path),
        None => DocDiscovery::from_env(),
    };

    if let Err(err) = run_stdio_server_with_discovery(discovery).await {
        eprintln!("appledeepdoc-mcp server failed: {err}");
        std::process::exit(1);
    }
}
