//! Event management slash command definitions

use serenity::builder::CreateApplicationCommand;
use serenity::model::application::command::CommandOptionType;

pub fn create_commands() -> Vec<CreateApplicationCommand> {
    vec![
        create_event_command(),
        create_events_command(),
        create_event_info_command(),
        create_join_event_command(),
        create_leave_event_command(),
    ]
}

fn create_event_command() -> CreateApplicationCommand {
    let mut command = CreateApplicationCommand::default();
    command
        .name("create_event")
        .description("Create a new event")
        .create_option(|option| {
            option
                .name("title")
                .description("Event title")
                .kind(CommandOptionType::String)
                .required(true)
                .min_length(1)
                .max_length(100)
        })
        .create_option(|option| {
            option
                .name("date")
                .description("Event date: YYYY-MM-DD HH:MM or DD/MM/YYYY HH:MM")
                .kind(CommandOptionType::String)
                .required(true)
        })
        .create_option(|option| {
            option
                .name("description")
                .description("Event description")
                .kind(CommandOptionType::String)
                .required(false)
                .max_length(1000)
        })
        .create_option(|option| {
            option
                .name("max_participants")
                .description("Participant limit (unlimited when omitted)")
                .kind(CommandOptionType::Integer)
                .required(false)
                .min_int_value(1)
        });
    command
}

fn create_events_command() -> CreateApplicationCommand {
    let mut command = CreateApplicationCommand::default();
    command
        .name("events")
        .description("List upcoming events on this server");
    command
}

fn event_id_command(name: &str, description: &str) -> CreateApplicationCommand {
    let mut command = CreateApplicationCommand::default();
    command
        .name(name)
        .description(description)
        .create_option(|option| {
            option
                .name("id")
                .description("The event ID")
                .kind(CommandOptionType::Integer)
                .required(true)
                .min_int_value(1)
        });
    command
}

fn create_event_info_command() -> CreateApplicationCommand {
    event_id_command("event_info", "Show details and participants of an event")
}

fn create_join_event_command() -> CreateApplicationCommand {
    event_id_command("join_event", "Join an event")
}

fn create_leave_event_command() -> CreateApplicationCommand {
    event_id_command("leave_event", "Leave an event")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_event_commands() {
        let commands = create_commands();
        assert_eq!(commands.len(), 5);

        let names: Vec<&str> = commands
            .iter()
            .map(|cmd| cmd.0.get("name").unwrap().as_str().unwrap())
            .collect();
        assert!(names.contains(&"create_event"));
        assert!(names.contains(&"join_event"));
    }
}
