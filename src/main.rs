use anyhow::Context;
use clap::Parser;
use quantum_tarot::config::load_config;
use quantum_tarot::utils::error::ErrorSeverity;
use quantum_tarot::utils::{logger, validation::Validate};
use quantum_tarot::{
    ChatCompletionClient, CliConfig, Command, QrngSource, TarotConfig, TarotEngine, TarotError,
    WebApp,
};

type Engine = TarotEngine<QrngSource, ChatCompletionClient>;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = CliConfig::parse();

    // 初始化日誌
    if cli.log_json {
        logger::init_json_logger(cli.verbose);
    } else {
        logger::init_cli_logger(cli.verbose);
    }

    tracing::info!("Starting quantum-tarot");
    if cli.verbose {
        tracing::debug!("CLI config: {:?}", cli);
    }

    let config = match load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ Failed to load configuration: {}", e);
            eprintln!("💡 {}", e.recovery_suggestion());
            std::process::exit(1);
        }
    };

    // 驗證配置
    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    let result = match cli.command {
        Command::Serve { port, static_dir } => serve(config, port, static_dir).await,
        Command::Draw {
            question,
            count,
            interpret,
        } => draw(config, &question, count, interpret).await,
    };

    if let Err(e) = result {
        let tarot_error = match e.downcast::<TarotError>() {
            Ok(tarot_error) => tarot_error,
            Err(other) => return Err(other),
        };

        tracing::error!(
            "❌ {} (Category: {:?}, Severity: {:?})",
            tarot_error,
            tarot_error.category(),
            tarot_error.severity()
        );
        eprintln!("❌ {}", tarot_error.user_friendly_message());
        eprintln!("💡 {}", tarot_error.recovery_suggestion());

        let exit_code = match tarot_error.severity() {
            ErrorSeverity::Low => 2,
            ErrorSeverity::Medium => 3,
            ErrorSeverity::High => 1,
            ErrorSeverity::Critical => 4,
        };
        std::process::exit(exit_code);
    }

    Ok(())
}

fn build_engine(config: &TarotConfig) -> quantum_tarot::Result<Engine> {
    let source = QrngSource::from_config(&config.entropy)?;
    let interpreter = ChatCompletionClient::from_config(&config.interpretation)?;
    Ok(TarotEngine::new(
        source,
        interpreter,
        config.interpretation.locale,
    ))
}

async fn serve(
    mut config: TarotConfig,
    port: Option<u16>,
    static_dir: Option<String>,
) -> anyhow::Result<()> {
    if let Some(dir) = static_dir {
        config.server.static_dir = dir;
    }

    let port = config.effective_port(port);
    let addr = format!("{}:{}", config.server.host, port);
    let app = WebApp::new(build_engine(&config)?, &config.server.static_dir);

    tracing::info!("📁 Serving static files from {}", config.server.static_dir);
    println!("Open your browser and visit http://localhost:{}", port);

    let handle = tokio::runtime::Handle::current();
    tokio::task::spawn_blocking(move || app.serve(&addr, handle))
        .await
        .context("server thread stopped unexpectedly")??;

    Ok(())
}

async fn draw(
    config: TarotConfig,
    question: &str,
    count: usize,
    interpret: bool,
) -> anyhow::Result<()> {
    let engine = build_engine(&config)?;
    let locale = engine.locale();

    println!("正在接收宇宙能量洗牌...");
    let snapshot = engine.start(question, count).await?;
    if let Some(method) = snapshot.shuffle_method {
        tracing::info!("🔀 Shuffle method: {:?}", method);
    }

    let picks: Vec<String> = snapshot.remaining.iter().take(count).cloned().collect();
    for card_id in picks {
        let outcome = engine.draw(&card_id).await?;
        let card = &outcome.card;
        println!(
            "{}. {} [{}] ({})",
            card.position,
            card.card.name(),
            card.card.arcana().label(),
            card.orientation.label(locale)
        );
    }

    if interpret {
        println!("抽取完成，正在解读...");
        match engine.interpret_session().await {
            Ok(outcome) => println!("\n{}", outcome.content),
            Err(e) => {
                tracing::warn!("Interpretation failed: {}", e);
                eprintln!("❌ {}", e.user_friendly_message());
            }
        }
    }

    Ok(())
}
