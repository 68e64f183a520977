use docker_registry_browser::cli::{Args, Runner};
use docker_registry_browser::logging::Logger;
use std::process;

#[tokio::main]
async fn main() {
    let args = Args::parse_args().from_env();
    let quiet = args.quiet;

    let result = match Runner::new(args) {
        Ok(runner) => runner.run().await,
        Err(e) => Err(e),
    };

    if let Err(e) = result {
        let output = if quiet { Logger::new_quiet() } else { Logger::default() };
        output.error(&e.to_string());
        process::exit(1);
    }
}
