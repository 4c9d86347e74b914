use criterion::{black_box, criterion_group, criterion_main, Criterion};
use nalgebra::Vector3;
use smina_run::command::container::ContainerSpec;
use smina_run::command::{CommandPaths, SminaCommand};
use smina_run::{BindingSite, SminaProperties};
use std::path::Path;

fn sample_paths() -> CommandPaths {
    CommandPaths {
        ligands: "/tmp/ligands.sdf".to_string(),
        receptor: "/tmp/receptor.pdbqt".to_string(),
        output_sdf: "/tmp/docked.sdf".to_string(),
    }
}

fn bench_build_command(c: &mut Criterion) {
    let props = SminaProperties::default();
    let site = BindingSite::new(Vector3::new(1.0, 2.0, 3.0), Vector3::new(20.0, 20.0, 20.0)).unwrap();
    let paths = sample_paths();

    c.bench_function("build_command", |b| {
        b.iter(|| {
            let command = SminaCommand::build(&props, 42, &site, &paths);
            black_box(command);
        })
    });
}

fn bench_container_wrap(c: &mut Criterion) {
    let props = SminaProperties {
        container_path: Some("docker".to_string()),
        ..SminaProperties::default()
    };
    let spec = ContainerSpec::from_properties(&props).unwrap().unwrap();
    let site = BindingSite::new(Vector3::new(1.0, 2.0, 3.0), Vector3::new(20.0, 20.0, 20.0)).unwrap();
    let command = SminaCommand::build(&props, 42, &site, &sample_paths());

    c.bench_function("container_wrap", |b| {
        b.iter(|| {
            let invocation = spec.wrap(&command, Path::new("/scratch/sandbox"), "/tmp/docked.log");
            let _ = black_box(invocation);
        })
    });
}

criterion_group!(command_benches, bench_build_command, bench_container_wrap);
criterion_main!(command_benches);
