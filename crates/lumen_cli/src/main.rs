use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use lumen_core::{load_scene, SceneDescription};
use lumen_renderer::{render_direct, ImageBuffer, Scene, SppmRenderer};

mod cli;

use cli::{Args, Mode};

fn main() -> Result<()> {
    let args = Args::parse();
    env_logger::Builder::new()
        .filter_level(args.log_level.into())
        .parse_default_env()
        .init();

    let start = Instant::now();
    let mut desc = load_scene(&args.scene)
        .with_context(|| format!("Failed to load scene {}", args.scene.display()))?;
    apply_overrides(&mut desc, &args);

    let base_dir = args.scene.parent().unwrap_or_else(|| Path::new("."));
    let scene = Scene::from_description(&desc, base_dir).context("Failed to build scene")?;
    log::info!("Scene ready in {:.2?}", start.elapsed());

    match args.mode {
        Mode::Sppm => render_sppm(&scene, &desc, &args)?,
        Mode::Direct => {
            let image = render_direct(&scene, &desc.preview).context("Preview render failed")?;
            save(&image, &output_path(&args.output, None), args.exposure)?;
        }
    }

    log::info!("Done in {:.2?}", start.elapsed());
    Ok(())
}

fn apply_overrides(desc: &mut SceneDescription, args: &Args) {
    if let Some(passes) = args.passes {
        desc.render.passes = passes;
    }
    if let Some(photons) = args.photons {
        desc.render.photons_per_light = photons;
    }
    if let Some(seed) = args.seed {
        desc.render.seed = seed;
        desc.preview.seed = seed;
    }
}

fn render_sppm(scene: &Scene, desc: &SceneDescription, args: &Args) -> Result<()> {
    let abort = Arc::new(AtomicBool::new(false));
    let mut renderer = SppmRenderer::new(scene, desc.render)
        .context("Cannot start photon mapping")?
        .with_cancel_flag(abort.clone());
    let passes = desc.render.passes;
    let save_every = args.save_every.max(1);

    let mut result = Ok(());
    renderer.render(|stats, image| {
        if result.is_err() || (stats.pass % save_every != 0 && stats.pass != passes) {
            return;
        }
        result = save(image, &output_path(&args.output, Some(stats.pass)), args.exposure);
        if result.is_err() {
            abort.store(true, Ordering::Relaxed);
        }
    });
    result
}

fn output_path(prefix: &str, pass: Option<u32>) -> PathBuf {
    match pass {
        Some(pass) => PathBuf::from(format!("{prefix}_{pass}.png")),
        None => PathBuf::from(format!("{prefix}.png")),
    }
}

fn save(image: &ImageBuffer, path: &Path, exposure: f32) -> Result<()> {
    image
        .save_png(path, exposure)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    log::info!("Wrote {}", path.display());
    Ok(())
}
