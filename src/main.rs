use clap::Parser;
use tracing::error;

#[derive(Parser, Debug)]
#[command(name = "mpwatch")]
#[command(about = "WeChat mini-program suspension watcher", long_about = None)]
struct Args {
    /// Path to config file
    #[arg(short, long)]
    config: Option<String>,
}

const LOG_DIR: &str = "logs";
const LOG_FILE: &str = "mpwatch.log";

fn main() {
    let args = Args::parse();
    if let Some(config) = args.config {
        std::env::set_var("MPWATCH_CONFIG", config);
    }

    let guard = init_logging();

    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .thread_name("mpwatch-rt")
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(err) => {
            eprintln!("runtime init failed: {err}");
            std::process::exit(1);
        }
    };

    let code = match runtime.block_on(mpwatch::run()) {
        Ok(()) => 0,
        Err(err) => {
            error!("run failed: {:#}", err);
            1
        }
    };

    // Drop the guard so buffered log lines reach the file before exit.
    drop(guard);
    std::process::exit(code);
}

fn init_logging() -> Option<tracing_appender::non_blocking::WorkerGuard> {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    // Ensure the directory exists before tracing-appender tries to open it.
    if let Err(err) = std::fs::create_dir_all(LOG_DIR) {
        eprintln!("warn: could not create log directory '{LOG_DIR}': {err}, logging to stdout only");
        tracing_subscriber::fmt().with_env_filter(filter).init();
        return None;
    }

    let appender = tracing_appender::rolling::never(LOG_DIR, LOG_FILE);
    let (file_writer, guard) = tracing_appender::non_blocking(appender);

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer())
        .with(fmt::layer().with_ansi(false).with_writer(file_writer))
        .init();

    Some(guard)
}
