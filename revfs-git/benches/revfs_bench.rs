// Copyright 2025 AgentReplay (https://github.com/agentreplay)
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use revfs_core::FsRoot;
use revfs_git::GitFs;
use revfs_storage::RepositoryBuilder;

/// Repository with `files` files spread over nested directories, where
/// revision 2 modifies a single file
fn wide_repository(files: usize) -> GitFs {
    let names: Vec<String> = (0..files)
        .map(|i| format!("dir{}/sub{}/file{}.txt", i % 16, i % 7, i))
        .collect();
    let v1: Vec<(&str, &str)> = names.iter().map(|n| (n.as_str(), "v1")).collect();
    let mut v2 = v1.clone();
    v2[0].1 = "v2";

    let mut builder = RepositoryBuilder::new();
    builder.commit_files("trunk", &v1).unwrap();
    builder.commit_files("trunk", &v2).unwrap();
    builder.copy_branch("trunk", "branches/stable").unwrap();
    GitFs::new(builder.objects(), builder.revisions())
}

fn bench_paths_changed(c: &mut Criterion) {
    let mut group = c.benchmark_group("paths_changed");

    for files in [100usize, 1000, 5000].iter() {
        let fs = wide_repository(*files);
        group.throughput(Throughput::Elements(*files as u64));
        group.bench_with_input(BenchmarkId::from_parameter(files), files, |b, _| {
            b.iter(|| {
                let root = fs.revision_root(black_box(2)).unwrap();
                root.paths_changed().unwrap().len()
            });
        });
    }

    group.finish();
}

fn bench_branch_resolution(c: &mut Criterion) {
    let fs = wide_repository(1000);

    c.bench_function("resolve_uncached", |b| {
        b.iter(|| {
            let root = fs.revision_root(3).unwrap();
            root.check_path(black_box("trunk/dir3/sub3/file3.txt")).unwrap()
        });
    });

    let root = fs.revision_root(3).unwrap();
    c.bench_function("resolve_cached", |b| {
        b.iter(|| root.check_path(black_box("branches/stable/dir5/sub5/file5.txt")).unwrap());
    });
}

fn bench_node_created_rev(c: &mut Criterion) {
    let fs = wide_repository(1000);
    let root = fs.revision_root(3).unwrap();

    c.bench_function("node_created_rev", |b| {
        b.iter(|| {
            root.node_created_rev(black_box("trunk/dir1/sub1/file1.txt"))
                .unwrap()
        });
    });
}

criterion_group!(
    benches,
    bench_paths_changed,
    bench_branch_resolution,
    bench_node_created_rev
);
criterion_main!(benches);
