//! Music slash command definitions

use serenity::builder::CreateApplicationCommand;
use serenity::model::application::command::CommandOptionType;

pub fn create_commands() -> Vec<CreateApplicationCommand> {
    let mut commands = vec![
        simple_command("join", "Join your current voice channel"),
        simple_command("leave", "Leave the voice channel and clear the queue"),
        simple_command("queue", "Show the music queue"),
        simple_command("nowplaying", "Show the track that is playing right now"),
        simple_command("skip", "Skip the current track"),
        simple_command("stop", "Stop playback and clear the queue"),
        simple_command("pause", "Pause playback"),
        simple_command("resume", "Resume playback"),
    ];
    commands.insert(2, create_play_command());
    commands.push(create_volume_command());
    commands.push(create_loop_command());
    commands
}

fn simple_command(name: &str, description: &str) -> CreateApplicationCommand {
    let mut command = CreateApplicationCommand::default();
    command.name(name).description(description);
    command
}

fn create_play_command() -> CreateApplicationCommand {
    let mut command = CreateApplicationCommand::default();
    command
        .name("play")
        .description("Play a track by name or URL")
        .create_option(|option| {
            option
                .name("query")
                .description("Song name or URL")
                .kind(CommandOptionType::String)
                .required(true)
                .min_length(1)
                .max_length(500)
        });
    command
}

fn create_volume_command() -> CreateApplicationCommand {
    let mut command = CreateApplicationCommand::default();
    command
        .name("volume")
        .description("Set the playback volume")
        .create_option(|option| {
            option
                .name("level")
                .description("Volume from 0 to 100")
                .kind(CommandOptionType::Integer)
                .required(true)
                .min_int_value(0)
                .max_int_value(100)
        });
    command
}

fn create_loop_command() -> CreateApplicationCommand {
    let mut command = CreateApplicationCommand::default();
    command
        .name("loop")
        .description("Repeat the current track instead of advancing")
        .create_option(|option| {
            option
                .name("enabled")
                .description("Whether to loop the current track")
                .kind(CommandOptionType::Boolean)
                .required(true)
        });
    command
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_music_commands() {
        let commands = create_commands();
        assert_eq!(commands.len(), 11);

        let names: Vec<&str> = commands
            .iter()
            .map(|cmd| cmd.0.get("name").unwrap().as_str().unwrap())
            .collect();
        for expected in ["join", "leave", "play", "queue", "nowplaying", "skip", "stop", "pause", "resume", "volume", "loop"] {
            assert!(names.contains(&expected), "Missing command: {expected}");
        }
    }
}
