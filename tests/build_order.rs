// tests/build_order.rs

use objdag::dag::{build_order, topological_order, TargetId};
use objdag::errors::BuildError;
use objdag_test_utils::builders::{SpecBuilder, TargetBuilder};
use objdag_test_utils::fixture::Fixture;
use objdag_test_utils::{init_tracing, with_timeout};

fn keys(fx: &Fixture, order: &[TargetId]) -> Vec<String> {
    order
        .iter()
        .map(|id| fx.registry.node(*id).key().to_string())
        .collect()
}

/// PGM uses the service program, which binds the module reading the file.
fn layered_fixture() -> Fixture {
    let spec = SpecBuilder::new()
        .stream_target("mylib.ordent.pgm.rpgle", "qrpglesrc/ordent.pgm.rpgle")
        .target(
            "mylib.ordsvc.srvpgm.bnd",
            TargetBuilder::new().param("MODULE", "ORDMOD"),
        )
        .stream_target("mylib.ordmod.module.rpgle", "qrpglesrc/ordmod.module.rpgle")
        .stream_target("mylib.orders.pf.dds", "qddssrc/orders.pf")
        .build();

    Fixture::new(spec)
        .source(
            "qrpglesrc/ordent.pgm.rpgle",
            "**free\nctl-opt bnddir('ORDBND');\ndcl-pr addOrder extproc('addOrder');\nend-pr;\n",
        )
        .source(
            "qrpglesrc/ordmod.module.rpgle",
            "**free\nctl-opt nomain;\ndcl-f orders usage(*output);\ndcl-proc addOrder export;\nend-proc;\n",
        )
        .source("qddssrc/orders.pf", "     A          R ORDREC\n")
}

#[tokio::test]
async fn build_order_puts_dependencies_first() {
    init_tracing();

    let fx = layered_fixture();
    with_timeout(fx.scan()).await.unwrap();

    let order = build_order(&fx.registry).unwrap();
    let names = keys(&fx, &order);
    let position = |key: &str| names.iter().position(|k| k == key).unwrap();

    assert_eq!(names.len(), 4);
    assert!(position("MYLIB.ORDERS.PF.DDS") < position("MYLIB.ORDMOD.MODULE.RPGLE"));
    assert!(position("MYLIB.ORDMOD.MODULE.RPGLE") < position("MYLIB.ORDSVC.SRVPGM.BND"));
    assert!(position("MYLIB.ORDMOD.MODULE.RPGLE") < position("MYLIB.ORDENT.PGM.RPGLE"));
}

#[tokio::test]
async fn topological_order_is_the_reverse_of_build_order() {
    init_tracing();

    let fx = layered_fixture();
    with_timeout(fx.scan()).await.unwrap();

    let mut topo = topological_order(&fx.registry).unwrap();
    topo.reverse();
    assert_eq!(topo, build_order(&fx.registry).unwrap());
}

#[tokio::test]
async fn detected_cycle_names_its_members() {
    init_tracing();

    let spec = SpecBuilder::new()
        .stream_target("mylib.pgma.pgm.rpgle", "qrpglesrc/pgma.pgm.rpgle")
        .stream_target("mylib.pgmb.pgm.rpgle", "qrpglesrc/pgmb.pgm.rpgle")
        .stream_target("mylib.pgmc.pgm.rpgle", "qrpglesrc/pgmc.pgm.rpgle")
        .build();
    let fx = Fixture::new(spec)
        .source(
            "qrpglesrc/pgma.pgm.rpgle",
            "**free\ndcl-pr b extpgm('PGMB');\nend-pr;\n",
        )
        .source(
            "qrpglesrc/pgmb.pgm.rpgle",
            "**free\ndcl-pr a extpgm('PGMA');\nend-pr;\n",
        )
        .source("qrpglesrc/pgmc.pgm.rpgle", "**free\n*inlr = *on;\n");

    with_timeout(fx.scan()).await.unwrap();

    match build_order(&fx.registry) {
        Err(BuildError::DependencyCycle(msg)) => {
            assert!(msg.contains("MYLIB.PGMA.PGM.RPGLE"));
            assert!(msg.contains("MYLIB.PGMB.PGM.RPGLE"));
            assert!(!msg.contains("MYLIB.PGMC.PGM.RPGLE"));
        }
        other => panic!("expected DependencyCycle, got {other:?}"),
    }
}
