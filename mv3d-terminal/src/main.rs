/// MV3D Terminal - browse STL and VRML models as shaded ASCII
///
/// Controls:
///   - n / p: Next / previous model
///   - m: Next material
///   - c: Toggle view (orbit) and object (spin) controls
///   - WASD / Arrow Keys: Orbit or spin
///   - + / -: Zoom
///   - Q/ESC: Quit

use clap::Parser;
use std::io;
use std::path::PathBuf;
use std::rc::Rc;
use mv3d_core::{
    fragment, normalize, ControlScheme, LoadedGeometry, LoaderRegistry, MaterialPalette,
    MemoryNavigation, Mesh, ModelList, ModelReference, ObjectContainer, Viewer,
};
use mv3d_terminal::{FsSource, TerminalApp};

#[derive(Parser, Debug)]
#[command(name = "mv3d-terminal", version, about = "Terminal 3D model viewer")]
struct Args {
    /// Model files to list (STL or VRML); a demo cube is shown if none are given
    models: Vec<String>,

    /// Prefix prepended to every model path
    #[arg(long, default_value = "")]
    base: String,

    /// JSON file with extra materials (name -> material)
    #[arg(long)]
    materials: Option<PathBuf>,

    /// Model to show first
    #[arg(long)]
    model: Option<String>,

    /// Initial control scheme: view or object
    #[arg(long, default_value = "view", value_parser = parse_controls)]
    controls: ControlScheme,
}

fn parse_controls(name: &str) -> Result<ControlScheme, String> {
    ControlScheme::parse(name).ok_or_else(|| format!("unknown control scheme `{name}`"))
}

fn main() -> io::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let args = Args::parse();

    let navigation = MemoryNavigation::new(args.model.as_deref().map(fragment::encode));
    let mut viewer = Viewer::new(
        LoaderRegistry::standard(Rc::new(FsSource)),
        ObjectContainer::new(),
        navigation,
    );

    viewer.add_materials(MaterialPalette::builtin());
    if let Some(path) = &args.materials {
        let json = std::fs::read_to_string(path)?;
        let palette = MaterialPalette::from_json(&json)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, format!("{}: {e}", path.display())))?;
        viewer.add_materials(palette);
    }

    if args.models.is_empty() {
        log::info!("no models given, showing the demo cube");
        let cube = normalize(LoadedGeometry::Raw(Mesh::cube(80.0)), None);
        viewer.add_reference(ModelReference::prebuilt("cube", cube));
    } else {
        viewer.add_models(ModelList::Locators(args.models), &args.base);
    }
    viewer.set_controls(args.controls);

    // Run the terminal app
    let mut app = TerminalApp::new(viewer)?;
    app.run()?;

    println!("Thank you for using MV3D Terminal!");
    Ok(())
}
