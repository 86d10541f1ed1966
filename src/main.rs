use std::error::Error;
use std::time::Instant;

use clap::Parser;
use log::{debug, info, LevelFilter};

use lumen::{Camera, HitCounter, RenderSettings, Scene, Tracer, Vec3};

fn parse_vec3(s: &str) -> Result<Vec3<f64>, String> {
    let parts: Vec<&str> = s.split(',').collect();
    if parts.len() != 3 {
        return Err(format!("expected x,y,z but got {s:?}"));
    }

    let mut values = [0.0; 3];
    for (value, part) in values.iter_mut().zip(&parts) {
        *value = part
            .trim()
            .parse()
            .map_err(|err| format!("bad component {part:?}: {err}"))?;
    }

    Ok(Vec3::new(values[0], values[1], values[2]))
}

#[derive(Parser)]
#[command(name = "lumen")]
#[command(about = "Render a JSON scene to a PNG with a Whitted-style ray tracer")]
struct Args {
    /// Scene description file
    #[arg(default_value = "scene.json")]
    scene: String,

    #[arg(long, default_value_t = 800)]
    width: u32,

    #[arg(long, default_value_t = 600)]
    height: u32,

    /// Output PNG path
    #[arg(short, long, default_value = "render.png")]
    output: String,

    /// Camera position as x,y,z
    #[arg(long, default_value = "0,1,-6", value_parser = parse_vec3)]
    position: Vec3<f64>,

    /// Camera target as x,y,z
    #[arg(long, default_value = "0,0,0", value_parser = parse_vec3)]
    look_at: Vec3<f64>,

    /// Vertical field of view in degrees
    #[arg(long, default_value_t = 60.0)]
    fov: f64,

    /// Recursion bound for reflection and refraction
    #[arg(long, default_value_t = 3)]
    depth: u16,

    #[arg(long)]
    no_shadows: bool,

    #[arg(long)]
    no_refraction: bool,

    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    env_logger::Builder::from_default_env()
        .filter_level(if args.verbose {
            LevelFilter::Debug
        } else {
            LevelFilter::Info
        })
        .init();

    let scene = Scene::load(&args.scene)?;
    info!(
        "loaded {}: {} objects, {} lights",
        args.scene,
        scene.objects.len(),
        scene.lights.len()
    );

    let camera = Camera::new(
        args.position,
        args.look_at,
        Vec3::new(0.0, 1.0, 0.0),
        args.fov,
        args.width as f64 / args.height as f64,
    );

    let settings = RenderSettings {
        shadows: !args.no_shadows,
        refraction: !args.no_refraction,
        max_depth: args.depth,
        ..RenderSettings::default()
    };

    let counter = HitCounter::default();
    let tracer = Tracer::new(&scene, settings).with_observer(&counter);

    let now = Instant::now();
    let pixels = tracer.render(&camera, args.width, args.height);
    info!(
        "rendered {}x{} in {:.3} ms",
        args.width,
        args.height,
        now.elapsed().as_secs_f64() * 1e3
    );
    debug!("{} ray hits, {} misses", counter.hits(), counter.misses());

    let image = image::RgbaImage::from_raw(args.width, args.height, pixels)
        .expect("framebuffer dimensions match the image");
    image.save(&args.output)?;
    info!("wrote {}", args.output);

    Ok(())
}
