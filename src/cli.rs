use core::convert::TryFrom;

use anyhow::{Error, Result};
use clap::{
    App,
    Arg,
    crate_version,
    SubCommand,
};

/// Default location of the credential store
pub const DEFAULT_STATE_FILE: &str = "state.oath";
/// Device id used when none is given
pub const DEFAULT_DEVICE_ID: &str = "software";

const ABOUT: &str = "
Software OATH authenticator, speaking the same credential and code model
as a hardware security key.
";

#[derive(Clone, Debug, PartialEq)]
/// What to do, parsed from the command line
pub enum Command {
    Add { uri: String, touch: bool },
    Rename { id: String, name: String, issuer: Option<String> },
    Delete { id: String },
    Calculate { id: String },
    Codes,
    Reset,
    EncodeId { text: String },
}

pub fn app() -> clap::App<'static, 'static> {

    let app = App::new("oath-model")
        .version(crate_version!())
        .about(ABOUT)
        .setting(clap::AppSettings::SubcommandRequiredElseHelp)

        .arg(Arg::with_name("STATE-FILE")
             .short("s")
             .long("state-file")
             .default_value(DEFAULT_STATE_FILE)
             .help("file containing the credential store")
             .required(false)
             .global(true)
        )
        .arg(Arg::with_name("DEVICE-ID")
             .short("d")
             .long("device-id")
             .default_value(DEFAULT_DEVICE_ID)
             .help("device id credentials are tagged with")
             .required(false)
             .global(true)
        )
        .arg(Arg::with_name("TIMESTAMP")
             .short("t")
             .long("timestamp")
             .help("time to calculate codes at, as seconds since the UNIX epoch")
             .value_name("TIMESTAMP")
             .required(false)
             .global(true)
        )
        .arg(Arg::with_name("verbose")
             .short("v")
             .multiple(true)
             .help("more log output, repeat for debug output")
             .global(true)
        )

        .subcommand(SubCommand::with_name("add")
            .about("add an account from an otpauth:// URI")
            .arg(Arg::with_name("uri")
                 .help("e.g. otpauth://totp/Example:alice@google.com?secret=JBSWY3DPEHPK3PXP")
                 .value_name("URI")
                 .required(true)
             )
            .arg(Arg::with_name("touch")
                 .long("touch")
                 .help("require touch to calculate codes")
             )
        )

        .subcommand(SubCommand::with_name("rename")
            .about("rename an account")
            .arg(Arg::with_name("id")
                 .help("hex id of the credential")
                 .value_name("ID")
                 .required(true)
             )
            .arg(Arg::with_name("name")
                 .help("new account name")
                 .value_name("NAME")
                 .required(true)
             )
            .arg(Arg::with_name("issuer")
                 .long("issuer")
                 .help("new issuer")
                 .value_name("ISSUER")
                 .takes_value(true)
             )
        )

        .subcommand(SubCommand::with_name("delete")
            .about("delete an account")
            .arg(Arg::with_name("id")
                 .help("hex id of the credential")
                 .value_name("ID")
                 .required(true)
             )
        )

        .subcommand(SubCommand::with_name("calculate")
            .about("calculate a code, touch and HOTP credentials included")
            .arg(Arg::with_name("id")
                 .help("hex id of the credential")
                 .value_name("ID")
                 .required(true)
             )
        )

        .subcommand(SubCommand::with_name("codes")
            .about("list all credentials with their current codes")
        )

        .subcommand(SubCommand::with_name("reset")
            .about("delete all credentials")
        )

        .subcommand(SubCommand::with_name("encode-id")
            .about("print the hex id of a raw credential id, e.g. ACME:alice")
            .arg(Arg::with_name("text")
                 .value_name("TEXT")
                 .required(true)
             )
        )
    ;

    app

}

fn required(args: &clap::ArgMatches<'_>, name: &str) -> Result<String> {
    args.value_of(name)
        .map(String::from)
        .ok_or_else(|| anyhow::anyhow!("missing argument {}", name))
}

impl TryFrom<&'_ clap::ArgMatches<'static>> for Command {
    type Error = Error;
    fn try_from(args: &clap::ArgMatches<'static>) -> Result<Self> {
        match args.subcommand() {
            ("add", Some(command)) => Ok(Command::Add {
                uri: required(command, "uri")?,
                touch: command.is_present("touch"),
            }),
            ("rename", Some(command)) => Ok(Command::Rename {
                id: required(command, "id")?,
                name: required(command, "name")?,
                issuer: command.value_of("issuer").map(String::from),
            }),
            ("delete", Some(command)) => Ok(Command::Delete { id: required(command, "id")? }),
            ("calculate", Some(command)) => Ok(Command::Calculate { id: required(command, "id")? }),
            ("codes", _) => Ok(Command::Codes),
            ("reset", _) => Ok(Command::Reset),
            ("encode-id", Some(command)) => Ok(Command::EncodeId { text: required(command, "text")? }),
            _ => Err(anyhow::anyhow!("Unexpected case")),
        }
    }
}

/// Clock override from `--timestamp`, in milliseconds.
pub fn timestamp(args: &clap::ArgMatches<'static>) -> Result<Option<u64>> {
    match args.value_of("TIMESTAMP") {
        Some(seconds) => Ok(Some(seconds.parse::<u64>()?.saturating_mul(1000))),
        None => Ok(None),
    }
}

pub fn log_level(args: &clap::ArgMatches<'static>) -> log::LevelFilter {
    match args.occurrences_of("verbose") {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        _ => log::LevelFilter::Debug,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(argv: &[&str]) -> clap::ArgMatches<'static> {
        app().get_matches_from_safe(argv.iter().copied()).unwrap()
    }

    #[test]
    fn add() {
        let args = parse(&["oath-model", "add", "otpauth://totp/alice?secret=JBSWY3DP", "--touch"]);
        assert_eq!(
            Command::try_from(&args).unwrap(),
            Command::Add { uri: "otpauth://totp/alice?secret=JBSWY3DP".into(), touch: true }
        );
    }

    #[test]
    fn rename_with_issuer() {
        let args = parse(&["oath-model", "rename", "616c696365", "bob", "--issuer", "ACME"]);
        assert_eq!(
            Command::try_from(&args).unwrap(),
            Command::Rename { id: "616c696365".into(), name: "bob".into(), issuer: Some("ACME".into()) }
        );
    }

    #[test]
    fn globals() {
        let args = parse(&["oath-model", "-s", "other.oath", "-t", "59", "-vv", "codes"]);
        assert_eq!(Command::try_from(&args).unwrap(), Command::Codes);
        assert_eq!(args.value_of("STATE-FILE"), Some("other.oath"));
        assert_eq!(args.value_of("DEVICE-ID"), Some(DEFAULT_DEVICE_ID));
        assert_eq!(timestamp(&args).unwrap(), Some(59_000));
        assert_eq!(log_level(&args), log::LevelFilter::Debug);
    }

    #[test]
    fn huge_timestamps_saturate() {
        let args = parse(&["oath-model", "-t", "18446744073709551", "codes"]);
        assert_eq!(timestamp(&args).unwrap(), Some(18_446_744_073_709_551_000));
        let args = parse(&["oath-model", "-t", "18446744073709552", "codes"]);
        assert_eq!(timestamp(&args).unwrap(), Some(u64::MAX));
        let args = parse(&["oath-model", "-t", "18446744073709551616", "codes"]);
        assert!(timestamp(&args).is_err());
    }

    #[test]
    fn bad_timestamp() {
        let args = parse(&["oath-model", "-t", "soon", "codes"]);
        assert!(timestamp(&args).is_err());
    }
}
