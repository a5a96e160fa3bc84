mod common;

use std::time::Duration;

use bytes::Bytes;
use common::{args, bulk, ok, options, MockServer};
use tandem::{Address, ConnPool, Error, MultiPool, PoolBuilder, PoolOptions, ServerVersion};

#[tokio::test]
async fn test_connect_reads_master_version() {
    let master = MockServer::start("3.2.12", |_| ok()).await;
    let pool = ConnPool::connect::<&str>(&master.addr, &[], &options())
        .await
        .unwrap();

    assert_eq!(pool.version(), ServerVersion::new(3, 2, 12));
    assert_eq!(pool.replica_count(), 0);
    assert_eq!(pool.master_addr().socket_addr(), master.addr);
}

#[tokio::test]
async fn test_connect_rejects_old_master() {
    let master = MockServer::start("2.6.11", |_| ok()).await;
    let res = ConnPool::connect::<&str>(&master.addr, &[], &options()).await;

    match res {
        Err(Error::NotSupported {
            required, actual, ..
        }) => {
            assert_eq!(required, ServerVersion::new(2, 6, 12));
            assert_eq!(actual, ServerVersion::new(2, 6, 11));
        }
        other => panic!("unexpected {other:?}"),
    }
}

#[tokio::test]
async fn test_connect_rejects_bad_address() {
    let res = ConnPool::connect::<&str>(":6379", &[], &options()).await;
    assert!(matches!(res, Err(Error::InvalidArgument { .. })));
}

#[tokio::test]
async fn test_writes_go_to_master_reads_to_replicas() {
    let master = MockServer::start("7.0.0", |_| ok()).await;
    let replica = MockServer::start("7.0.0", |_| bulk("from-replica")).await;
    let pool = ConnPool::connect(&master.addr, &[replica.addr.as_str()], &options())
        .await
        .unwrap();

    pool.set("k", "v").await.unwrap();
    let value = pool.get("k").await.unwrap();

    assert_eq!(value, Some(Bytes::from("from-replica")));
    assert_eq!(master.commands(), vec![args(&["SET", "k", "v"])]);
    assert_eq!(replica.commands(), vec![args(&["GET", "k"])]);
}

#[tokio::test]
async fn test_reads_without_replicas_use_master() {
    let master = MockServer::start("7.0.0", |_| bulk("v")).await;
    let pool = ConnPool::connect::<&str>(&master.addr, &[], &options())
        .await
        .unwrap();

    pool.get("k").await.unwrap();
    pool.strlen("k").await.ok();

    assert_eq!(master.count("GET"), 1);
    assert_eq!(master.count("STRLEN"), 1);
}

#[tokio::test]
async fn test_replica_rotation_is_fair() {
    let master = MockServer::start("7.0.0", |_| ok()).await;
    let r1 = MockServer::start("7.0.0", |_| bulk("1")).await;
    let r2 = MockServer::start("7.0.0", |_| bulk("2")).await;
    let r3 = MockServer::start("7.0.0", |_| bulk("3")).await;
    let replicas = [r1.addr.as_str(), r2.addr.as_str(), r3.addr.as_str()];
    let pool = ConnPool::connect(&master.addr, &replicas, &options())
        .await
        .unwrap();

    for _ in 0..10 {
        pool.get("k").await.unwrap();
    }

    let mut counts = [r1.count("GET"), r2.count("GET"), r3.count("GET")];
    counts.sort_unstable();
    assert_eq!(counts, [3, 3, 4]);
    assert_eq!(master.count("GET"), 0);
}

#[tokio::test]
async fn test_version_gate_sends_nothing() {
    let master = MockServer::start("3.0.0", |_| ok()).await;
    let pool = ConnPool::connect::<&str>(&master.addr, &[], &options())
        .await
        .unwrap();

    let res = pool.unlink(&["a", "b"]).await;

    match res {
        Err(Error::NotSupported {
            command,
            required,
            actual,
        }) => {
            assert_eq!(command, "UNLINK");
            assert_eq!(required, ServerVersion::new(4, 0, 0));
            assert_eq!(actual, ServerVersion::new(3, 0, 0));
        }
        other => panic!("unexpected {other:?}"),
    }
    assert!(master.commands().is_empty());
}

#[tokio::test]
async fn test_connection_released_after_server_error() {
    let master = MockServer::start("7.0.0", |_| {
        tandem::Frame::Error(b"WRONGTYPE Operation against a key holding the wrong kind of value".to_vec())
    })
    .await;
    let opts = PoolOptions {
        max_active: 1,
        connection_timeout: Duration::from_millis(500),
        ..PoolOptions::default()
    };
    let pool = ConnPool::connect::<&str>(&master.addr, &[], &opts)
        .await
        .unwrap();

    // With a single connection, a leaked checkout would time out the next call.
    for _ in 0..3 {
        match pool.incr("k").await {
            Err(Error::Server { message }) => assert!(message.starts_with("WRONGTYPE")),
            other => panic!("unexpected {other:?}"),
        }
    }
}

#[tokio::test]
async fn test_checkout_times_out_when_exhausted() {
    let master = MockServer::start("7.0.0", |_| ok()).await;
    let opts = PoolOptions {
        max_active: 1,
        connection_timeout: Duration::from_millis(100),
        ..PoolOptions::default()
    };
    let pool = ConnPool::connect::<&str>(&master.addr, &[], &opts)
        .await
        .unwrap();

    let _held = pool.master_conn().await.unwrap();
    let res = pool.master_conn().await;
    assert!(matches!(res, Err(Error::Timeout)));
}

#[tokio::test]
async fn test_builder_builds_pool() {
    let master = MockServer::start("5.0.7", |_| ok()).await;
    let replica = MockServer::start("5.0.7", |_| ok()).await;

    let pool = PoolBuilder::new()
        .master(master.addr.clone())
        .replica(replica.addr.clone())
        .max_active(2)
        .read_timeout(Some(Duration::from_secs(1)))
        .build()
        .await
        .unwrap();

    assert_eq!(pool.replica_count(), 1);
    assert_eq!(pool.version(), ServerVersion::new(5, 0, 7));
}

#[tokio::test]
async fn test_multipool_registers_and_lazily_adds() {
    let a = MockServer::start("7.0.0", |_| ok()).await;
    let b = MockServer::start("7.0.0", |_| ok()).await;

    let multi = MultiPool::new(&[Address::simple(a.addr.clone())], options())
        .await
        .unwrap();
    assert_eq!(multi.len().await, 1);

    let first = multi.get(&a.addr).await.unwrap();
    let again = multi.get(&a.addr).await.unwrap();
    assert!(std::sync::Arc::ptr_eq(&first, &again));

    let lazy = multi.get(&b.addr).await.unwrap();
    assert_eq!(lazy.replica_count(), 0);
    assert_eq!(multi.len().await, 2);

    lazy.set("k", "v").await.unwrap();
    assert_eq!(b.commands(), vec![args(&["SET", "k", "v"])]);

    assert!(multi.remove(&a.addr).await.is_some());
    assert_eq!(multi.len().await, 1);
}

#[tokio::test]
async fn test_multipool_add_replaces() {
    let master = MockServer::start("7.0.0", |_| ok()).await;
    let replica = MockServer::start("7.0.0", |_| ok()).await;

    let multi = MultiPool::new(&[], options()).await.unwrap();
    assert!(multi.is_empty().await);

    multi.add(&Address::simple(master.addr.clone())).await.unwrap();
    let replaced = multi
        .add(&Address::new(master.addr.clone(), [replica.addr.clone()]))
        .await
        .unwrap();

    assert_eq!(replaced.replica_count(), 1);
    assert_eq!(multi.get(&master.addr).await.unwrap().replica_count(), 1);
    assert_eq!(multi.len().await, 1);
}

#[tokio::test]
async fn test_select_sent_for_non_zero_db() {
    let master = MockServer::start("7.0.0", |_| ok()).await;
    let conn_str = format!("{}:pw:3", master.addr);
    let pool = ConnPool::connect::<&str>(&conn_str, &[], &options())
        .await
        .unwrap();

    pool.set("k", "v").await.unwrap();

    let cmds = master.commands();
    assert_eq!(cmds[0], args(&["AUTH", "pw"]));
    assert_eq!(cmds[1], args(&["SELECT", "3"]));
    assert_eq!(cmds.last().unwrap(), &args(&["SET", "k", "v"]));
}

#[tokio::test]
async fn test_cancelled_request_does_not_leak_reply() {
    let master = MockServer::start("7.0.0", |cmd| match cmd[0].as_str() {
        "GET" => bulk("second"),
        _ => ok(),
    })
    .await;
    let opts = PoolOptions {
        max_active: 1,
        test_on_borrow: false,
        ..options()
    };
    let pool = ConnPool::connect::<&str>(&master.addr, &[], &opts)
        .await
        .unwrap();

    {
        let mut set = Box::pin(pool.set("k", "first"));
        assert!(futures::poll!(set).is_pending());
    }

    let value = pool.get("k").await.unwrap();
    assert_eq!(value, Some(Bytes::from("second")));
}
