//! Weather command handlers
//!
//! Handles: weather, forecast
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.4.0

use anyhow::Result;
use async_trait::async_trait;
use log::warn;
use serenity::builder::CreateEmbed;
use serenity::model::application::interaction::application_command::ApplicationCommandInteraction;
use serenity::prelude::Context;
use std::sync::Arc;

use crate::commands::context::CommandContext;
use crate::commands::handler::SlashCommandHandler;
use crate::commands::handlers::{followup_embed, followup_text, respond_text};
use crate::commands::slash::{get_integer_option, get_string_option};
use crate::core::embeds::colors;
use crate::features::weather::{CurrentWeather, Forecast};

/// Handler for weather lookups
pub struct WeatherHandler;

#[async_trait]
impl SlashCommandHandler for WeatherHandler {
    fn command_names(&self) -> &'static [&'static str] {
        &["weather", "forecast"]
    }

    async fn handle(
        &self,
        ctx: Arc<CommandContext>,
        serenity_ctx: &Context,
        command: &ApplicationCommandInteraction,
    ) -> Result<()> {
        if !ctx.weather.is_configured() {
            return respond_text(
                serenity_ctx,
                command,
                "❌ The weather feature is not configured on this bot.",
            )
            .await;
        }

        let city = get_string_option(&command.data.options, "city")
            .ok_or_else(|| anyhow::anyhow!("Missing city parameter"))?;

        command.defer(&serenity_ctx.http).await?;

        match command.data.name.as_str() {
            "weather" => self.handle_current(&ctx, serenity_ctx, command, &city).await,
            "forecast" => self.handle_forecast(&ctx, serenity_ctx, command, &city).await,
            _ => Ok(()),
        }
    }
}

impl WeatherHandler {
    async fn handle_current(
        &self,
        ctx: &CommandContext,
        serenity_ctx: &Context,
        command: &ApplicationCommandInteraction,
        city: &str,
    ) -> Result<()> {
        match ctx.weather.current(city).await {
            Ok(Some(weather)) => {
                followup_embed(serenity_ctx, command, current_weather_embed(&weather)).await
            }
            Ok(None) => {
                followup_text(
                    serenity_ctx,
                    command,
                    "❌ Couldn't fetch weather data. Check the city name and try again.",
                )
                .await
            }
            Err(e) => {
                warn!("Weather lookup failed for {city}: {e}");
                followup_text(serenity_ctx, command, "❌ The weather service is unavailable.").await
            }
        }
    }

    async fn handle_forecast(
        &self,
        ctx: &CommandContext,
        serenity_ctx: &Context,
        command: &ApplicationCommandInteraction,
        city: &str,
    ) -> Result<()> {
        let days = get_integer_option(&command.data.options, "days").unwrap_or(3).clamp(1, 10) as u8;

        match ctx.weather.forecast(city, days).await {
            Ok(Some(forecast)) => {
                followup_embed(serenity_ctx, command, forecast_embed(&forecast)).await
            }
            Ok(None) => {
                followup_text(
                    serenity_ctx,
                    command,
                    "❌ Couldn't fetch forecast data. Check the city name and try again.",
                )
                .await
            }
            Err(e) => {
                warn!("Forecast lookup failed for {city}: {e}");
                followup_text(serenity_ctx, command, "❌ The weather service is unavailable.").await
            }
        }
    }
}

fn current_weather_embed(weather: &CurrentWeather) -> CreateEmbed {
    let current = &weather.current;
    let mut embed = CreateEmbed::default();
    embed
        .title(format!(
            "🌤️ Current weather in {}, {}",
            weather.location.name, weather.location.country
        ))
        .description(&current.condition.text)
        .color(colors::PRIMARY)
        .field("🌡️ Temperature", format!("{:.1}°C", current.temp_c), true)
        .field("🤒 Feels like", format!("{:.1}°C", current.feelslike_c), true)
        .field("💧 Humidity", format!("{:.0}%", current.humidity), true)
        .field("💨 Wind", format!("{:.1} km/h", current.wind_kph), true)
        .field("📊 Pressure", format!("{:.0} hPa", current.pressure_mb), true)
        .field("🌧️ Precipitation", format!("{:.1} mm", current.precip_mm), true)
        .field("☀️ UV index", format!("{:.0}", current.uv), true)
        .field("👁️ Visibility", format!("{:.0} km", current.vis_km), true)
        .thumbnail(format!("http:{}", current.condition.icon))
        .footer(|f| f.text("Data from WeatherAPI • Use /forecast for the coming days"));
    embed
}

fn forecast_embed(forecast: &Forecast) -> CreateEmbed {
    let mut embed = CreateEmbed::default();
    embed
        .title(format!(
            "📅 Forecast for {}, {}",
            forecast.location.name, forecast.location.country
        ))
        .color(colors::PRIMARY)
        .footer(|f| f.text("Data from WeatherAPI"));

    for day in forecast.days() {
        embed.field(
            format!("📆 {}", day.date),
            format!(
                "{}\n🌡️ {:.0}°C to {:.0}°C\n🌧️ Rain chance: {:.0}%",
                day.day.condition.text, day.day.mintemp_c, day.day.maxtemp_c,
                day.day.daily_chance_of_rain
            ),
            true,
        );
    }
    embed
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_weather_handler_commands() {
        let handler = WeatherHandler;
        assert_eq!(handler.command_names(), &["weather", "forecast"]);
    }
}
