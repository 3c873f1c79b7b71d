//! Weather slash command definitions

use serenity::builder::CreateApplicationCommand;
use serenity::model::application::command::CommandOptionType;

pub fn create_commands() -> Vec<CreateApplicationCommand> {
    vec![create_weather_command(), create_forecast_command()]
}

fn create_weather_command() -> CreateApplicationCommand {
    let mut command = CreateApplicationCommand::default();
    command
        .name("weather")
        .description("Current weather for a city")
        .create_option(|option| {
            option
                .name("city")
                .description("City name")
                .kind(CommandOptionType::String)
                .required(true)
                .min_length(1)
                .max_length(100)
        });
    command
}

fn create_forecast_command() -> CreateApplicationCommand {
    let mut command = CreateApplicationCommand::default();
    command
        .name("forecast")
        .description("Weather forecast for the next few days")
        .create_option(|option| {
            option
                .name("city")
                .description("City name")
                .kind(CommandOptionType::String)
                .required(true)
                .min_length(1)
                .max_length(100)
        })
        .create_option(|option| {
            option
                .name("days")
                .description("Number of days (default 3)")
                .kind(CommandOptionType::Integer)
                .required(false)
                .min_int_value(1)
                .max_int_value(10)
        });
    command
}
