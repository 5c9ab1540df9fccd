use taskmate_app::util::{init_tracing, install_panic_hook};
use taskmate_app::{App, AppConfig, Command};

#[tokio::main]
async fn main() {
    let args: Vec<String> = std::env::args().skip(1).collect();
    if matches!(args.first().map(String::as_str), Some("-h" | "--help" | "help")) {
        println!("{}", taskmate_app::USAGE);
        return;
    }

    let config = match AppConfig::load() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("Init error: {err}");
            std::process::exit(2);
        }
    };

    init_tracing(config.log_filter());
    install_panic_hook();

    let command = match Command::parse(&args) {
        Ok(command) => command,
        Err(err) => {
            eprintln!("{err}");
            std::process::exit(2);
        }
    };

    let app = match App::start(&config).await {
        Ok(app) => app,
        Err(err) => {
            tracing::error!(error = %err, "boot failed");
            eprintln!("Init error: {err:#}");
            std::process::exit(1);
        }
    };

    match app.run(command).await {
        Ok(output) => println!("{output}"),
        Err(err) => {
            eprintln!("error: {err:#}");
            std::process::exit(1);
        }
    }
}
