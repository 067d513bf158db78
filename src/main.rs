extern crate clap;
extern crate env_logger;
#[macro_use]
extern crate log;
extern crate transp;

use std::process;
use std::time::Instant;

use transp::prelude::*;
use transp::scene::{self, entity};

fn main() {
    env_logger::init();

    let matches = clap::App::new("transp")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Order-independent transparency techniques, switchable at runtime")
        .arg(
            clap::Arg::with_name("entity")
                .short("e")
                .long("entity")
                .takes_value(true)
                .value_name("path")
                .help("Sets the OBJ file of the entity [default: entity.obj]"),
        )
        .arg(
            clap::Arg::with_name("material")
                .short("m")
                .long("material")
                .help("Colors the entity with its materials instead of a depth gradient"),
        )
        .arg(
            clap::Arg::with_name("borderless")
                .short("b")
                .long("borderless")
                .help("Runs in a 1920x1080 borderless window"),
        )
        .arg(
            clap::Arg::with_name("single")
                .short("s")
                .long("single")
                .help("Shows one object instead of two"),
        )
        .arg(
            clap::Arg::with_name("config")
                .short("c")
                .long("config")
                .takes_value(true)
                .value_name("path")
                .help("Reads settings from a JSON file"),
        )
        .arg(
            clap::Arg::with_name("background")
                .multiple(true)
                .value_name("bg-texture.(png|jpg)")
                .help("Sets the background image"),
        )
        .get_matches();

    let backgrounds: Vec<&str> = matches
        .values_of("background")
        .map(|v| v.collect())
        .unwrap_or_default();

    if backgrounds.len() != 1 {
        eprintln!("Expecting exactly one non-option argument");
        process::exit(1);
    }

    if let Err(err) = run(&matches, backgrounds[0]) {
        eprintln!("Error: {}", err);
        for cause in err.iter_causes() {
            eprintln!("  caused by: {}", cause);
        }

        process::exit(1);
    }
}

fn settings(matches: &clap::ArgMatches) -> Result<Settings> {
    let mut settings = match matches.value_of("config") {
        Some(path) => Settings::load(path)?,
        None => Settings::default(),
    };

    if let Some(path) = matches.value_of("entity") {
        settings.entity = path.into();
    }

    if matches.is_present("material") {
        settings.gradient = false;
    }

    if matches.is_present("borderless") {
        settings.borderless = true;
    }

    if matches.is_present("single") {
        settings.two_objects = false;
    }

    settings.validate()?;
    Ok(settings)
}

fn run(matches: &clap::ArgMatches, background: &str) -> Result<()> {
    let settings = settings(matches)?;

    let data = entity::load(&settings.entity, !settings.gradient)?;
    let groups = entity::triangulate(&data, settings.gradient)?;

    let mut window = WindowSystem::from(WindowParams {
        title: "transp".to_owned(),
        size: settings.window_size(),
        borderless: settings.borderless,
        vsync: settings.vsync,
    })?;

    let mut video = VideoSystem::new()?;
    video.resize(window.dimensions())?;

    let texture = scene::background(&mut video, background)?;
    let mut demo = Demo::new(&mut video, &settings, &groups, texture)?;

    let mut title = demo.title();
    window.set_title(&title);

    let mut timestamp = Instant::now();
    'main: loop {
        for v in window.poll_events() {
            if !demo.on(&mut video, v)? {
                break 'main;
            }
        }

        if demo.title() != title {
            title = demo.title();
            window.set_title(&title);
        }

        let now = Instant::now();
        let elapsed = now - timestamp;
        timestamp = now;

        let dt = elapsed.as_secs() as f32 + elapsed.subsec_nanos() as f32 * 1e-9;
        let info = demo.frame(&mut video, dt)?;
        trace!("Frame of {} drawcalls.", info.drawcalls);

        video.flush()?;
        window.swap_buffers()?;
    }

    info!("Quits.");
    demo.delete(&mut video)
}
