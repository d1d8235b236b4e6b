use spendwise::{create_app, mailer, settings::read_config, trace};

async fn start_up() -> color_eyre::Result<()> {
    // We don't care if we can't read the dotenv
    let _ = dotenv::dotenv();

    let config = read_config()?;
    trace::setup(&config.log)?;

    let mailer = mailer(&config)?;
    let (_, app) = create_app(config, mailer).await?;
    app.await?;

    Ok(())
}

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    if let Err(err) = start_up().await {
        eprintln!("{err:?}");
        std::process::exit(1);
    }

    Ok(())
}
