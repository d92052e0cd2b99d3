use ast::{find_token, AstArena, AstNode, GrammarKind, Keyword, NodeBuilder, SourceFile};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use detectors::DetectorRegistry;

/// Package specification with `procedures` procedures of four parameters each,
/// one of which is an implicit IN table of NVARCHAR2
fn package<'a>(b: &NodeBuilder<'a>, procedures: usize) -> AstNode<'a> {
    let mut members = vec![
        b.keyword(Keyword::Create),
        b.keyword(Keyword::Package),
        b.identifier("bench"),
    ];

    for i in 0..procedures {
        b.newline();
        let mut procedure = vec![b.keyword(Keyword::Procedure), b.identifier(&format!("proc{}", i))];
        for (j, mode) in [Keyword::In, Keyword::Out, Keyword::In].into_iter().enumerate() {
            procedure.push(b.node(
                GrammarKind::ParameterDeclaration,
                vec![
                    b.identifier(&format!("p{}", j)),
                    b.keyword(mode),
                    b.node(GrammarKind::Datatype, vec![b.keyword(Keyword::Varchar2)]),
                ],
            ));
        }
        procedure.push(b.node(
            GrammarKind::ParameterDeclaration,
            vec![
                b.identifier("p3"),
                b.node(
                    GrammarKind::Datatype,
                    vec![b.node(
                        GrammarKind::TableOfDeclaration,
                        vec![
                            b.keyword(Keyword::Table),
                            b.keyword(Keyword::Of),
                            b.node(GrammarKind::Datatype, vec![b.keyword(Keyword::Nvarchar2)]),
                        ],
                    )],
                ),
            ],
        ));
        members.push(b.node(GrammarKind::ProcedureDeclaration, procedure));
    }

    b.node(
        GrammarKind::CompilationUnit,
        vec![b.node(GrammarKind::CreatePackage, members)],
    )
}

fn benchmark_locator(c: &mut Criterion) {
    let arena = AstArena::new();
    let b = NodeBuilder::new(&arena);
    let mut datatype = b.keyword(Keyword::Nvarchar2);
    for _ in 0..64 {
        datatype = b.node(
            GrammarKind::Datatype,
            vec![b.keyword(Keyword::Varchar2), datatype, b.keyword(Keyword::Number)],
        );
    }

    c.bench_function("find_token nested datatype", |bench| {
        bench.iter(|| find_token(black_box(&datatype), "nvarchar2"))
    });
}

fn benchmark_registry(c: &mut Criterion) {
    let registry = DetectorRegistry::with_all_detectors();
    let mut group = c.benchmark_group("registry");

    for procedures in [10, 100, 1000] {
        let arena = AstArena::new();
        let b = NodeBuilder::new(&arena);
        let file = SourceFile::new(&arena, "bench.pks", package(&b, procedures));

        group.bench_with_input(
            BenchmarkId::new("run_analysis", procedures),
            &file,
            |bench, file| bench.iter(|| registry.run_analysis(black_box(file))),
        );
    }
    group.finish();
}

criterion_group!(benches, benchmark_locator, benchmark_registry);
criterion_main!(benches);
