//! Utility slash command definitions

use serenity::builder::CreateApplicationCommand;
use serenity::model::application::command::CommandOptionType;

pub fn create_commands() -> Vec<CreateApplicationCommand> {
    vec![
        simple_command("ping", "Check that the bot is alive"),
        simple_command("uptime", "How long the bot has been running"),
        simple_command("version", "Show the bot version"),
        create_roll_command(),
    ]
}

fn simple_command(name: &str, description: &str) -> CreateApplicationCommand {
    let mut command = CreateApplicationCommand::default();
    command.name(name).description(description);
    command
}

fn create_roll_command() -> CreateApplicationCommand {
    let mut command = CreateApplicationCommand::default();
    command
        .name("roll")
        .description("Roll a die")
        .create_option(|option| {
            option
                .name("sides")
                .description("Number of sides (default 6)")
                .kind(CommandOptionType::Integer)
                .required(false)
                .min_int_value(2)
                .max_int_value(1000)
        });
    command
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_utility_commands() {
        let commands = create_commands();
        assert_eq!(commands.len(), 4);
    }
}
