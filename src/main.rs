use ai_weather::weather::semantics::format_duration;
use ai_weather::{
    AiWeatherConfig, CurrentConditions, DailyForecastEntry, ForecastHorizon, HourlyForecastEntry,
    Settings, Theme, WeatherError, WeatherFacade,
};
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{debug, error};

/// Current weather, daily and hourly forecasts with an AI comfort score
#[derive(Parser, Debug)]
#[command(name = "ai-weather", version, about)]
struct Cli {
    /// Path to a TOML config file. Defaults to <config dir>/ai-weather/config.toml
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log at debug level regardless of configuration
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Current conditions with comfort score and clothing advice
    Current { place: String },
    /// Daily forecast
    Daily {
        place: String,
        /// Forecast horizon: 7, 10 or 16 days. Saved as the new default
        #[arg(long, value_parser = parse_horizon)]
        days: Option<ForecastHorizon>,
    },
    /// Hourly forecast for the next seven days
    Hourly { place: String },
    /// Current, daily and hourly data fetched together
    All {
        place: String,
        #[arg(long, value_parser = parse_horizon)]
        days: Option<ForecastHorizon>,
    },
    /// Show or update persisted settings
    Settings {
        #[arg(long, value_parser = parse_horizon)]
        days: Option<ForecastHorizon>,
        /// system, light or dark
        #[arg(long)]
        theme: Option<Theme>,
    },
}

fn parse_horizon(value: &str) -> std::result::Result<ForecastHorizon, String> {
    let days: u8 = value
        .parse()
        .map_err(|_| format!("'{value}' is not a number of days"))?;
    ForecastHorizon::try_from(days).map_err(|e| e.to_string())
}

fn init_tracing(config: &AiWeatherConfig, verbose: bool) -> Result<()> {
    use tracing_subscriber::EnvFilter;
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    let env_filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level))
    };
    let registry = tracing_subscriber::registry().with(env_filter);

    if config.logging.format == "json" {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .try_init()?;
    } else {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(false)
                    .with_writer(std::io::stderr),
            )
            .try_init()?;
    }
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match AiWeatherConfig::load_from_path(cli.config.clone()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {e:#}");
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = init_tracing(&config, cli.verbose) {
        eprintln!("Failed to initialize logging: {e:#}");
    }

    match run(cli.command, &config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e:#}");
            match e.downcast_ref::<WeatherError>() {
                Some(weather_error) => eprintln!("{}", weather_error.user_message()),
                None => eprintln!("Error: {e:#}"),
            }
            ExitCode::FAILURE
        }
    }
}

async fn run(command: Command, config: &AiWeatherConfig) -> Result<()> {
    let settings_path = config.settings_path();
    let fallback = Settings::with_horizon(ForecastHorizon::try_from(config.defaults.forecast_days)?);
    let mut settings = Settings::load_or(&settings_path, fallback)?;
    debug!("Using settings {:?}", settings);

    match command {
        Command::Settings { days, theme } => {
            if days.is_some() || theme.is_some() {
                settings.forecast_days = days.unwrap_or(settings.forecast_days);
                settings.theme = theme.unwrap_or(settings.theme);
                settings.save(&settings_path)?;
            }
            println!("Forecast horizon: {}", settings.forecast_days);
            println!("Theme: {}", settings.theme);
            println!("Stored at: {}", settings_path.display());
        }
        Command::Current { place } => {
            let mut facade = select_place(config, settings.forecast_days, &place).await?;
            let current = facade.fetch_current().await?;
            print_current(&current);
        }
        Command::Daily { place, days } => {
            let horizon = remember_horizon(&mut settings, days, &settings_path)?;
            let mut facade = select_place(config, horizon, &place).await?;
            let daily = facade.fetch_daily(horizon).await?;
            print_daily(&daily);
        }
        Command::Hourly { place } => {
            let mut facade = select_place(config, settings.forecast_days, &place).await?;
            let hourly = facade.fetch_hourly().await?;
            print_hourly(&hourly);
        }
        Command::All { place, days } => {
            let horizon = remember_horizon(&mut settings, days, &settings_path)?;
            let mut facade = select_place(config, horizon, &place).await?;
            let bundle = facade.fetch_all().await?;

            let mut failures = 0;
            match bundle.current {
                Ok(current) => print_current(&current),
                Err(e) => report_part_failure("Current conditions", &e, &mut failures),
            }
            println!();
            match bundle.daily {
                Ok(daily) => print_daily(&daily),
                Err(e) => report_part_failure("Daily forecast", &e, &mut failures),
            }
            println!();
            match bundle.hourly {
                Ok(hourly) => print_hourly(&hourly),
                Err(e) => report_part_failure("Hourly forecast", &e, &mut failures),
            }

            if failures == 3 {
                anyhow::bail!("No weather data could be loaded for '{place}'");
            }
        }
    }
    Ok(())
}

fn remember_horizon(
    settings: &mut Settings,
    days: Option<ForecastHorizon>,
    path: &std::path::Path,
) -> Result<ForecastHorizon> {
    if let Some(horizon) = days {
        if horizon != settings.forecast_days {
            settings.forecast_days = horizon;
            settings.save(path)?;
        }
    }
    Ok(settings.forecast_days)
}

async fn select_place(
    config: &AiWeatherConfig,
    horizon: ForecastHorizon,
    place: &str,
) -> Result<WeatherFacade> {
    let mut facade =
        WeatherFacade::from_config(config, horizon).context("Failed to set up weather client")?;
    let selected = facade.set_place(place).await?;
    println!(
        "{} ({})",
        selected.label(),
        selected.coordinates.format_coordinates()
    );
    Ok(facade)
}

fn report_part_failure(what: &str, err: &WeatherError, failures: &mut u32) {
    error!("{what} failed: {err}");
    eprintln!("{what}: {}", err.user_message());
    *failures += 1;
}

fn number(value: Option<f64>, unit: &str) -> String {
    value.map_or_else(|| "-".to_string(), |v| format!("{v:.1}{unit}"))
}

fn text(value: Option<&str>) -> &str {
    value.unwrap_or("-")
}

fn print_current(current: &CurrentConditions) {
    println!("Current conditions");
    if let Some(observed_at) = current.observed_at {
        println!("  Observed:      {}", observed_at.format("%Y-%m-%d %H:%M"));
    }
    println!("  Weather:       {}", text(current.weather_code_label.as_deref()));
    println!(
        "  Temperature:   {} (feels like {})",
        number(current.temperature, "°C"),
        number(current.feels_like, "°C")
    );
    println!("  Humidity:      {}", number(current.humidity, "%"));
    println!("  Precipitation: {}", number(current.precipitation, " mm"));
    println!(
        "  Wind:          {} from {}",
        number(current.wind_speed, " km/h"),
        text(current.wind_direction_label.as_deref())
    );
    println!("  Cloud cover:   {}", number(current.cloud_cover, "%"));

    match (current.comfort_score, current.advice.as_deref()) {
        (Some(score), Some(advice)) => {
            println!("  Comfort:       {score}/10");
            println!("  Advice:        {advice}");
        }
        _ => println!("  Comfort:       unavailable"),
    }
}

fn print_daily(daily: &[DailyForecastEntry]) {
    println!("Daily forecast ({} days)", daily.len());
    for day in daily {
        println!(
            "  {}  {:<32} {:>8} / {:<8} rain {:>7} ({:>6}) wind {:>10} {:<16} daylight {:>8} UV {}",
            day.date.format("%a %d %b"),
            text(day.weather_code_label.as_deref()),
            number(day.temp_min, "°C"),
            number(day.temp_max, "°C"),
            number(day.precipitation_sum, " mm"),
            number(day.precipitation_probability, "%"),
            number(day.wind_speed_max, " km/h"),
            text(day.wind_direction_label.as_deref()),
            day.daylight_duration
                .map_or_else(|| "-".to_string(), format_duration),
            number(day.uv_index_max, ""),
        );
    }
}

fn print_hourly(hourly: &[HourlyForecastEntry]) {
    println!("Hourly forecast ({} hours)", hourly.len());
    for hour in hourly {
        println!(
            "  {}  {:<32} {:>8} hum {:>6} rain {:>7} clouds {:>6} wind {:>10} vis {:>9} soil {}/{}/{}/{}",
            hour.timestamp.format("%a %d %b %H:%M"),
            text(hour.weather_code_label.as_deref()),
            number(hour.temperature, "°C"),
            number(hour.humidity, "%"),
            number(hour.precipitation, " mm"),
            number(hour.cloud_cover, "%"),
            number(hour.wind_speed, " km/h"),
            number(hour.visibility, " m"),
            number(hour.soil_temperature_0cm, ""),
            number(hour.soil_temperature_6cm, ""),
            number(hour.soil_temperature_18cm, ""),
            number(hour.soil_temperature_54cm, "°C"),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("7", ForecastHorizon::Week)]
    #[case("10", ForecastHorizon::TenDays)]
    #[case("16", ForecastHorizon::SixteenDays)]
    fn test_parse_horizon(#[case] input: &str, #[case] expected: ForecastHorizon) {
        assert_eq!(parse_horizon(input).unwrap(), expected);
    }

    #[rstest]
    #[case("8")]
    #[case("week")]
    #[case("")]
    fn test_parse_horizon_rejects(#[case] input: &str) {
        assert!(parse_horizon(input).is_err());
    }

    #[test]
    fn test_cli_parses_daily_with_days() {
        let cli = Cli::try_parse_from(["ai-weather", "daily", "Paris", "--days", "16"]).unwrap();
        match cli.command {
            Command::Daily { place, days } => {
                assert_eq!(place, "Paris");
                assert_eq!(days, Some(ForecastHorizon::SixteenDays));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_remember_horizon_saves_change() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        let mut settings = Settings::default();

        let horizon =
            remember_horizon(&mut settings, Some(ForecastHorizon::TenDays), &path).unwrap();
        assert_eq!(horizon, ForecastHorizon::TenDays);
        assert_eq!(Settings::load(&path).unwrap().forecast_days, ForecastHorizon::TenDays);

        let horizon = remember_horizon(&mut settings, None, &path).unwrap();
        assert_eq!(horizon, ForecastHorizon::TenDays);
    }
}
