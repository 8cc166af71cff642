pub mod settings;
pub mod utility;

use vesper_core::{Data, Error};

pub struct CommandMeta {
    pub name: &'static str,
    pub desc: &'static str,
    pub category: &'static str,
    pub usage: &'static str,
}

pub const COMMANDS: &[CommandMeta] = &[
    utility::ping::META,
    utility::help::META,
    settings::setchannel::META,
    settings::setdelay::META,
    settings::enable::META,
    settings::disable::META,
    settings::status::META,
];

pub fn commands() -> Vec<poise::Command<Data, Error>> {
    vec![
        utility::ping::ping(),
        utility::help::help(),
        settings::setchannel::setchannel(),
        settings::setdelay::setdelay(),
        settings::enable::enable(),
        settings::disable::disable(),
        settings::status::status(),
    ]
}
