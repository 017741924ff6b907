/// Example: decode a model file and print what the viewer would attach
///
/// Usage: cargo run --example inspect_model -- path/to/file.stl

use std::env;
use std::fs;
use std::io;
use mv3d_core::{
    compute_fit_scale, model, normalize, GeometryFormat, NodeKind, CANONICAL_SIZE,
};

fn main() -> io::Result<()> {
    let args: Vec<String> = env::args().collect();

    let Some(path) = args.get(1) else {
        eprintln!("Usage: {} <model-file>", args[0]);
        return Ok(());
    };

    let (name, kind) = model::derive(path);
    let format = kind
        .as_deref()
        .and_then(GeometryFormat::from_kind)
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, format!("unsupported type {kind:?}")))?;

    let data = fs::read(path)?;
    let geometry = format
        .decode(&data)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;

    let renderable = normalize(geometry, None);
    println!("{name} ({})", format.kind());
    match renderable.kind() {
        NodeKind::Mesh(node) => {
            println!("  triangles: {}", node.mesh.triangles.len());
            println!("  extent:    {:?}", node.bounds.extent());
            println!("  radius:    {:.3}", node.sphere.radius);
            match compute_fit_scale(node, CANONICAL_SIZE) {
                Ok(scale) => println!("  fit scale: {scale:.4}"),
                Err(_) => println!("  fit scale: degenerate, model would not be shown"),
            }
        }
        NodeKind::Group(scene) => {
            println!("  parts:     {}", scene.parts.len());
            println!("  triangles: {}", scene.triangle_count());
        }
    }

    Ok(())
}
