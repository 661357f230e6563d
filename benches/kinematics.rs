use criterion::{black_box, criterion_group, criterion_main, Criterion};
use nalgebra::Vector3;
use rustdock_grid::{
    Atom, AtomType, Branch, Dock, DockingParameters, EnergyMap, Field, Grid, GridDimensions,
    Ligand, MapKey, Protein, Rotation,
};

/// Zig-zag chain of `n` carbons with a rotatable bond between every pair
/// of inner atoms
fn chain_dock(n: u32) -> Dock {
    let atoms: Vec<Atom> = (1..=n)
        .map(|id| {
            let x = id as f64 * 0.75;
            let y = if id % 2 == 0 { 0.6 } else { 0.0 };
            Atom::new(id, AtomType::Carbon, Vector3::new(x, y, 0.0), 0.0)
        })
        .collect();
    let branches: Vec<Branch> = (2..n - 1)
        .map(|link| Branch::new(link - 1, link, (link + 1..=n).collect()))
        .collect();
    let ligand = Ligand::new(atoms, branches, Vector3::new(n as f64 * 0.375, 0.3, 0.0));

    let field = Field::new(Vector3::new(-20.0, -20.0, -20.0), 1.0, GridDimensions::new(41, 41, 41))
        .expect("valid field");
    let dims = field.dimensions();
    let mut grid = Grid::new(field);
    for key in [MapKey::Electrostatic, MapKey::Desolvation, MapKey::AtomType(AtomType::Carbon)] {
        grid.insert_map(key, EnergyMap::from_fn(dims, |_, _, _| 0.0))
            .expect("matching dimensions");
    }

    Dock::new(ligand, Protein::rigid(), grid, DockingParameters::default()).expect("valid session")
}

fn bench_rotate_branches(c: &mut Criterion) {
    let mut dock = chain_dock(24);
    let angles = vec![0.01; dock.torsion_count()];

    c.bench_function("rotate_branches", |b| {
        b.iter(|| {
            dock.rotate_branches(black_box(&angles)).expect("matching angle count");
        })
    });
}

fn bench_transform_ligand_root(c: &mut Criterion) {
    let mut dock = chain_dock(24);
    let rotation = Rotation::from_angle_axis(0.01, &Vector3::new(0.0, 0.0, 1.0)).expect("valid axis");
    // Keep the about point in place
    let translation = dock.ligand().about;

    c.bench_function("transform_ligand_root", |b| {
        b.iter(|| {
            dock.transform_ligand_root(black_box(&translation), black_box(&rotation));
        })
    });
}

criterion_group!(kinematics_benches, bench_rotate_branches, bench_transform_ligand_root);
criterion_main!(kinematics_benches);
