//! Reminder slash command definitions

use serenity::builder::CreateApplicationCommand;
use serenity::model::application::command::CommandOptionType;

pub fn create_commands() -> Vec<CreateApplicationCommand> {
    vec![
        create_remind_command(),
        create_my_reminders_command(),
        create_cancel_reminder_command(),
    ]
}

fn create_remind_command() -> CreateApplicationCommand {
    let mut command = CreateApplicationCommand::default();
    command
        .name("remind")
        .description("Create a reminder")
        .create_option(|option| {
            option
                .name("time")
                .description("When to remind you: 5m, 2h, 1d, HH:MM, or YYYY-MM-DD HH:MM")
                .kind(CommandOptionType::String)
                .required(true)
                .min_length(1)
                .max_length(50)
        })
        .create_option(|option| {
            option
                .name("message")
                .description("What to remind you about")
                .kind(CommandOptionType::String)
                .required(true)
                .min_length(1)
                .max_length(1000)
        })
        .create_option(|option| {
            option
                .name("recurring")
                .description("Repeat the reminder on a fixed interval")
                .kind(CommandOptionType::String)
                .required(false)
                .add_string_choice("hourly - every hour", "hourly")
                .add_string_choice("daily - every day", "daily")
                .add_string_choice("weekly - every 7 days", "weekly")
                .add_string_choice("monthly - every 30 days", "monthly")
        });
    command
}

fn create_my_reminders_command() -> CreateApplicationCommand {
    let mut command = CreateApplicationCommand::default();
    command
        .name("my_reminders")
        .description("List your pending reminders");
    command
}

fn create_cancel_reminder_command() -> CreateApplicationCommand {
    let mut command = CreateApplicationCommand::default();
    command
        .name("cancel_reminder")
        .description("Cancel one of your reminders")
        .create_option(|option| {
            option
                .name("id")
                .description("The reminder ID to cancel")
                .kind(CommandOptionType::Integer)
                .required(true)
                .min_int_value(1)
        });
    command
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_reminder_commands() {
        let commands = create_commands();
        assert_eq!(commands.len(), 3);

        let names: Vec<&str> = commands
            .iter()
            .map(|cmd| cmd.0.get("name").unwrap().as_str().unwrap())
            .collect();
        assert_eq!(names, vec!["remind", "my_reminders", "cancel_reminder"]);
    }
}
