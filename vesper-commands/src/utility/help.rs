use poise::serenity_prelude as serenity;

use crate::{COMMANDS, CommandMeta};
use vesper_core::{Context, Error};
use vesper_utils::embed::DEFAULT_EMBED_COLOR;

pub const META: CommandMeta = CommandMeta {
    name: "help",
    desc: "Lists out all available commands.",
    category: "utility",
    usage: "!help",
};

#[poise::command(prefix_command, slash_command, category = "Utility")]
pub async fn help(ctx: Context<'_>) -> Result<(), Error> {
    let embed = serenity::CreateEmbed::new()
        .color(DEFAULT_EMBED_COLOR)
        .title("Available Commands")
        .description(grouped_help_description())
        .footer(serenity::CreateEmbedFooter::new(
            "Join notifications are held back so accidental joins stay quiet.",
        ));

    ctx.send(poise::CreateReply::default().ephemeral(true).embed(embed))
        .await?;
    Ok(())
}

fn grouped_help_description() -> String {
    let mut categories: Vec<&str> = COMMANDS.iter().map(|command| command.category).collect();
    categories.sort_unstable();
    categories.dedup();

    let mut sections = Vec::with_capacity(categories.len());
    for category in categories {
        let mut lines = vec![format!("**{}**", capitalize(category))];
        let mut commands: Vec<&CommandMeta> = COMMANDS
            .iter()
            .filter(|command| command.category == category)
            .collect();
        commands.sort_unstable_by_key(|command| command.name);

        for command in commands {
            lines.push(format!("`{}` - {}", command.usage, command.desc));
        }
        sections.push(lines.join("\n"));
    }

    sections.join("\n\n")
}

fn capitalize(raw: &str) -> String {
    let mut chars = raw.chars();
    match chars.next() {
        Some(first) => format!("{}{}", first.to_uppercase(), chars.as_str()),
        None => String::new(),
    }
}
