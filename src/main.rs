use core::convert::TryFrom;

use anyhow::Result;
use log::info;

use oath_model::{
    api::OathApi,
    authenticator::Authenticator,
    cli,
    convert,
    view_model::{Clock, FixedClock, SessionViewModel, SystemClock},
};

fn main() -> Result<()> {

    let args = init_app();
    init_logger(&args)?;

    let command = cli::Command::try_from(&args)?;
    if let cli::Command::EncodeId { text } = &command {
        println!("{}", convert::encode_id(text.as_bytes()));
        return Ok(());
    }

    let state_file = args.value_of("STATE-FILE").unwrap_or(cli::DEFAULT_STATE_FILE);
    let device_id = args.value_of("DEVICE-ID").unwrap_or(cli::DEFAULT_DEVICE_ID);
    let now = match cli::timestamp(&args)? {
        Some(timestamp) => timestamp,
        None => SystemClock.now(),
    };

    let authenticator = Authenticator::load(state_file)?;
    let view_model = SessionViewModel::new(authenticator, device_id, FixedClock(now));
    let mut api = OathApi::new(view_model);
    info!("using {} as {}", state_file, device_id);

    match command {
        cli::Command::Add { uri, touch } => println!("{}", api.add_account(&uri, touch)?),
        cli::Command::Rename { id, name, issuer: Some(issuer) } => {
            println!("{}", api.rename_account_with_issuer(&id, &name, &issuer)?)
        }
        cli::Command::Rename { id, name, issuer: None } => println!("{}", api.rename_account(&id, &name)?),
        cli::Command::Delete { id } => api.delete_account(&id)?,
        cli::Command::Calculate { id } => println!("{}", api.calculate(&id)?),
        cli::Command::Codes => println!("{}", api.refresh_codes()?),
        cli::Command::Reset => api.reset()?,
        cli::Command::EncodeId { .. } => {}
    }

    // calculating advances HOTP counters, so every command but `encode-id` saves
    api.view_model().authenticator().save(state_file)?;

    Ok(())
}

pub fn init_app() -> clap::ArgMatches<'static> {
    let app = cli::app();
    let matches = app.get_matches();
    matches
}

pub fn init_logger(args: &clap::ArgMatches<'static>) -> Result<()> {
    simple_logger::SimpleLogger::new()
        .with_level(cli::log_level(args))
        .init()?;
    Ok(())
}
