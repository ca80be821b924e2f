use eframe::egui::ViewportBuilder;
use music_tag::{
    app::{window_size, MusicTagApp},
    config::Config,
};

fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = Config::load().unwrap_or_else(|err| {
        log::warn!("Using built-in defaults: {err:#}");
        Config::default()
    });
    if let Some(path) = &config.source {
        log::info!("Loaded config from {}", path.display());
    }

    let native_options = eframe::NativeOptions {
        viewport: ViewportBuilder::default()
            .with_title("Music Tag")
            .with_inner_size(window_size(&config.theme))
            .with_transparent(true),
        ..Default::default()
    };
    let run_res = eframe::run_native(
        "Music Tag",
        native_options,
        Box::new(
            |_cc| -> std::result::Result<
                Box<dyn eframe::App>,
                Box<dyn std::error::Error + Send + Sync>,
            > { Ok(Box::new(MusicTagApp::new(config))) },
        ),
    );
    if let Err(e) = run_res {
        return Err(Box::new(e));
    }

    Ok(())
}
