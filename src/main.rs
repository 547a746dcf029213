use std::path::Path;

use scanview::{options::Options, Viewer};

/// Options file picked up from the working directory when present.
const OPTIONS_FILE: &str = "scanview.toml";

fn load_options() -> Options {
    let path = Path::new(OPTIONS_FILE);
    if !path.exists() {
        return Options::default();
    }
    match Options::load(path) {
        Ok(options) => {
            log::info!("loaded options from {OPTIONS_FILE}");
            options
        }
        Err(e) => {
            log::warn!("ignoring {OPTIONS_FILE}: {e}");
            Options::default()
        }
    }
}

fn main() {
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let Some(model) = args.next() else {
        log::error!("usage: scanview <model.obj|URL> [texture]");
        std::process::exit(2);
    };

    let mut builder = Viewer::builder()
        .with_model(&model)
        .with_options(load_options());
    if let Some(texture) = args.next() {
        builder = builder.with_texture(texture);
    }

    if let Err(e) = builder.build().run() {
        log::error!("{e}");
        std::process::exit(1);
    }
}
