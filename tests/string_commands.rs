mod common;

use bytes::Bytes;
use common::{args, array, bulk, int, nil, ok, pool_replying, pool_with};
use tandem::{BitFieldOp, BitOp, Error, Frame, Overflow, SetOptions};

#[tokio::test]
async fn test_get_hit_and_miss() {
    let (server, pool) = pool_with("7.0.0", |cmd| match cmd[1].as_str() {
        "present" => bulk("value"),
        _ => nil(),
    })
    .await;

    assert_eq!(pool.get("present").await.unwrap(), Some(Bytes::from("value")));
    assert_eq!(pool.get("missing").await.unwrap(), None);
    assert_eq!(server.last(), args(&["GET", "missing"]));
}

#[tokio::test]
async fn test_set_with_options() {
    let (server, pool) = pool_replying("7.0.0", ok()).await;

    let written = pool
        .set_with("k", "v", SetOptions::default().ex(10).px(99).nx())
        .await
        .unwrap();

    assert!(written);
    assert_eq!(server.last(), args(&["SET", "k", "v", "EX", "10", "NX"]));
}

#[tokio::test]
async fn test_set_with_condition_not_met() {
    let (_server, pool) = pool_replying("7.0.0", nil()).await;

    let written = pool
        .set_with("k", "v", SetOptions::default().xx())
        .await
        .unwrap();
    assert!(!written);
}

#[tokio::test]
async fn test_mset_sends_only_pairs() {
    let (server, pool) = pool_replying("7.0.0", ok()).await;

    pool.mset(&[("a", "1"), ("b", "2")]).await.unwrap();

    assert_eq!(server.last(), args(&["MSET", "a", "1", "b", "2"]));
}

#[tokio::test]
async fn test_msetnx_and_setnx_bools() {
    let (_server, pool) = pool_replying("7.0.0", int(0)).await;

    assert!(!pool.msetnx(&[("a", "1")]).await.unwrap());
    assert!(!pool.setnx("a", "1").await.unwrap());
}

#[tokio::test]
async fn test_mget_keeps_positions() {
    let (server, pool) =
        pool_replying("7.0.0", array(vec![bulk("1"), nil(), bulk("3")])).await;

    let values = pool.mget(&["a", "b", "c"]).await.unwrap();

    assert_eq!(
        values,
        vec![Some(Bytes::from("1")), None, Some(Bytes::from("3"))]
    );
    assert_eq!(server.last(), args(&["MGET", "a", "b", "c"]));
}

#[tokio::test]
async fn test_mget_empty_keys_rejected() {
    let (server, pool) = pool_replying("7.0.0", ok()).await;

    let res = pool.mget(&[]).await;
    assert!(matches!(res, Err(Error::InvalidArgument { .. })));
    assert!(server.commands().is_empty());
}

#[tokio::test]
async fn test_counters() {
    let (server, pool) = pool_with("7.0.0", |cmd| match cmd[0].as_str() {
        "INCRBYFLOAT" => bulk("10.5"),
        _ => int(7),
    })
    .await;

    assert_eq!(pool.incr("n").await.unwrap(), 7);
    assert_eq!(pool.incr_by("n", 5).await.unwrap(), 7);
    assert_eq!(pool.decr_by("n", -2).await.unwrap(), 7);
    assert_eq!(pool.incr_by_float("f", 0.5).await.unwrap(), 10.5);

    let cmds = server.commands();
    assert_eq!(cmds[1], args(&["INCRBY", "n", "5"]));
    assert_eq!(cmds[2], args(&["DECRBY", "n", "-2"]));
    assert_eq!(cmds[3], args(&["INCRBYFLOAT", "f", "0.5"]));
}

#[tokio::test]
async fn test_bitcount_range_and_bitop() {
    let (server, pool) = pool_replying("7.0.0", int(3)).await;

    assert_eq!(pool.bitcount("k", Some((0, -1))).await.unwrap(), 3);
    assert_eq!(server.last(), args(&["BITCOUNT", "k", "0", "-1"]));

    pool.bitop(BitOp::Xor, "dest", &["a", "b"]).await.unwrap();
    assert_eq!(server.last(), args(&["BITOP", "XOR", "dest", "a", "b"]));

    let res = pool.bitop(BitOp::Not, "dest", &["a", "b"]).await;
    assert!(matches!(res, Err(Error::InvalidArgument { .. })));
}

#[tokio::test]
async fn test_bitpos_gated_and_args() {
    let (old_server, old) = pool_replying("2.8.6", int(0)).await;
    assert!(matches!(
        old.bitpos("k", true, None, None).await,
        Err(Error::NotSupported { .. })
    ));
    assert!(old_server.commands().is_empty());

    let (server, pool) = pool_replying("2.8.7", int(12)).await;
    assert_eq!(pool.bitpos("k", false, Some(2), None).await.unwrap(), 12);
    assert_eq!(server.last(), args(&["BITPOS", "k", "0", "2"]));
}

#[tokio::test]
async fn test_bitfield() {
    let (server, pool) = pool_replying("3.2.0", array(vec![int(1), nil()])).await;

    let ops = [
        BitFieldOp::IncrBy {
            ty: "u2".into(),
            offset: "100".into(),
            increment: 1,
        },
        BitFieldOp::Overflow(Overflow::Fail),
        BitFieldOp::Set {
            ty: "i8".into(),
            offset: "#0".into(),
            value: 300,
        },
    ];
    let res = pool.bitfield("k", &ops).await.unwrap();

    assert_eq!(res, vec![Some(1), None]);
    assert_eq!(
        server.last(),
        args(&[
            "BITFIELD", "k", "INCRBY", "u2", "100", "1", "OVERFLOW", "FAIL", "SET", "i8", "#0",
            "300"
        ])
    );
}

#[tokio::test]
async fn test_bitfield_requires_3_2() {
    let (_server, pool) = pool_replying("3.0.7", ok()).await;
    let ops = [BitFieldOp::Get {
        ty: "u8".into(),
        offset: "0".into(),
    }];
    assert!(matches!(
        pool.bitfield("k", &ops).await,
        Err(Error::NotSupported { command: "BITFIELD", .. })
    ));
}

#[tokio::test]
async fn test_getrange_and_getset() {
    let (_server, pool) = pool_with("7.0.0", |cmd| match cmd[0].as_str() {
        "GETRANGE" => bulk(""),
        _ => nil(),
    })
    .await;

    assert_eq!(pool.getrange("k", 0, 3).await.unwrap(), Bytes::new());
    assert_eq!(pool.getset("k", "v").await.unwrap(), None);
}

#[tokio::test]
async fn test_expiring_sets() {
    let (server, pool) = pool_replying("7.0.0", ok()).await;

    pool.setex("k", 60, "v").await.unwrap();
    assert_eq!(server.last(), args(&["SETEX", "k", "60", "v"]));
    pool.psetex("k", 1500, "v").await.unwrap();
    assert_eq!(server.last(), args(&["PSETEX", "k", "1500", "v"]));
}

#[tokio::test]
async fn test_unexpected_reply_shape_is_protocol_error() {
    let (_server, pool) = pool_replying("7.0.0", Frame::Array(vec![])).await;
    assert!(matches!(pool.strlen("k").await, Err(Error::Protocol { .. })));
}

#[tokio::test]
#[ignore]
async fn test_live_strings() {
    let pool = tandem::PoolBuilder::new()
        .master("127.0.0.1:6379")
        .build()
        .await
        .expect("Failed to connect");

    pool.del(&["live:str", "live:counter"]).await.unwrap();
    pool.set("live:str", "hello").await.unwrap();
    assert_eq!(pool.append("live:str", " world").await.unwrap(), 11);
    assert_eq!(
        pool.get("live:str").await.unwrap(),
        Some(Bytes::from("hello world"))
    );
    assert_eq!(pool.incr("live:counter").await.unwrap(), 1);
    assert!(!pool
        .set_with("live:str", "x", SetOptions::default().nx())
        .await
        .unwrap());
}
