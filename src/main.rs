use std::{io, path::PathBuf, thread};

use alarm_trigger::{
    communication::forward_answers,
    config::Config,
    matcher,
    sound::{AlertSound, RodioAlert, SilentAlert},
    source::{AlarmSource, FileSource},
    Clock, TerminalScreen, Urgency,
};
use chrono::{NaiveTime, Timelike};
use clap::{Parser, Subcommand};
use log::{info, warn};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// use this config file instead of the one in the config dir
    #[clap(long, short)]
    config: Option<PathBuf>,
    #[clap(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// write the default config
    Init {
        #[clap(long, short)]
        force: bool,
    },
    NewAlarm {
        hour: u32,
        minute: u32,
        #[clap(long, short, default_value = "low")]
        difficulty: Urgency,
    },
    RemoveAlarm {
        id: u64,
    },
    List,
    /// show which alarm would ring at the given time (HH:MM, defaults to now)
    Check {
        #[clap(long)]
        at: Option<String>,
    },
    /// ring alarms until stopped (the default)
    Run,
}

fn main() -> alarm_trigger::Result<()> {
    // initilize the logger
    if let Err(e) = simple_file_logger::init_logger!("alarm_trigger") {
        eprintln!("couldn't initialize logger: {e:?}");
    }

    let args = Args::parse();
    let config_path = match args.config {
        Some(path) => path,
        None => Config::config_path()?,
    };
    let load = || -> alarm_trigger::Result<(Config, FileSource)> {
        let config = Config::load_or_default(config_path.clone())?;
        let source = FileSource::from_config(&config)?;
        Ok((config, source))
    };

    match args.command.unwrap_or(Command::Run) {
        Command::Init { force } => {
            if force || !config_path.exists() {
                Config::new().save(config_path.clone())?;
                println!("wrote {}", config_path.display());
            } else {
                println!(
                    "{} already exists, use --force to overwrite",
                    config_path.display()
                );
            }
        }
        Command::NewAlarm {
            hour,
            minute,
            difficulty,
        } => {
            let (_, mut source) = load()?;
            let alarm = source.create_alarm(hour, minute, difficulty)?;
            println!("added {alarm}");
        }
        Command::RemoveAlarm { id } => {
            let (_, mut source) = load()?;
            source.delete_alarm(id)?;
            println!("removed alarm {id}");
        }
        Command::List => {
            let (_, mut source) = load()?;
            for alarm in source.list_alarms()? {
                println!("{alarm}");
            }
        }
        Command::Check { at } => {
            let (_, mut source) = load()?;
            let now = match at {
                Some(at) => NaiveTime::parse_from_str(&at, "%H:%M")?,
                None => chrono::Local::now().naive_local().time(),
            };
            let alarms = source.list_alarms()?;
            match matcher::check_now(&alarms, &now) {
                Some(alarm) => println!("{alarm} rings at {:02}:{:02}", now.hour(), now.minute()),
                None => println!("nothing rings at {:02}:{:02}", now.hour(), now.minute()),
            }
        }
        Command::Run => {
            let (config, source) = load()?;
            run(config, source);
        }
    }
    Ok(())
}

fn open_sound(config: &Config) -> Box<dyn AlertSound> {
    match RodioAlert::open(config.sound.as_deref(), config.volume) {
        Ok(sound) => Box::new(sound),
        Err(e) => {
            // alarms still go through the challenge, just without noise
            warn!("{e}, alarms will be silent");
            eprintln!("{e}, alarms will be silent");
            Box::new(SilentAlert::default())
        }
    }
}

fn run(config: Config, source: FileSource) {
    info!("watching alarms in {}", source.path().display());
    let sound = open_sound(&config);
    let clock = Clock::new(config, source, sound, TerminalScreen);
    let handle = clock.handle();
    // stdin may be closed from the start when running as a service
    thread::spawn(move || forward_answers(io::stdin().lock(), &handle));
    clock.run();
}
