//! Benchmarks for shader source resolution.

use std::fs;
use std::path::Path;

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};

use fragcompute::shader::resolve;

/// Root file including `fanout` modules, each of which includes every
/// shared leaf, so all but the first leaf inclusion are skipped.
fn write_tree(dir: &Path, fanout: usize) {
    fs::create_dir_all(dir.join("lib")).unwrap();
    for leaf in 0..8 {
        let body: String = (0..32)
            .map(|i| format!("float leaf{}_{}(float x) {{ return x * {}.0; }}\n", leaf, i, i))
            .collect();
        fs::write(dir.join(format!("lib/leaf{}.glsl", leaf)), body).unwrap();
    }
    let mut root = String::from("#version 330 core\n");
    for m in 0..fanout {
        let includes: String = (0..8)
            .map(|leaf| format!("#include \"lib/leaf{}.glsl\"\n", leaf))
            .collect();
        fs::write(
            dir.join(format!("module{}.glsl", m)),
            format!("{}float module{}() {{ return 0.0; }}\n", includes, m),
        )
        .unwrap();
        root.push_str(&format!("#include \"module{}.glsl\"\n", m));
    }
    root.push_str("void main() {}\n");
    fs::write(dir.join("root.frag"), root).unwrap();
}

fn bench_resolve(c: &mut Criterion) {
    let mut group = c.benchmark_group("resolve");

    for fanout in [1, 8, 64] {
        let dir = tempfile::tempdir().unwrap();
        write_tree(dir.path(), fanout);
        let root = dir.path().join("root.frag");

        group.bench_with_input(BenchmarkId::from_parameter(fanout), &root, |b, root| {
            b.iter(|| black_box(resolve(root).unwrap()))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_resolve);
criterion_main!(benches);
