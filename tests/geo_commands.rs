mod common;

use common::{args, array, bulk, int, nil, options, pool_replying, pool_with, MockServer};
use tandem::{ConnPool, Error, Frame, GeoMember, GeoRadiusOptions, GeoUnit};

fn palermo_reply() -> Frame {
    array(vec![array(vec![
        bulk("Palermo"),
        bulk("190.4424"),
        array(vec![bulk("13.36138933897018433"), bulk("38.11555639549629859")]),
    ])])
}

async fn master_and_replica(version: &str) -> (MockServer, MockServer, ConnPool) {
    let master = MockServer::start(version, |_| palermo_reply()).await;
    let replica = MockServer::start(version, |_| palermo_reply()).await;
    let pool = ConnPool::connect(&master.addr, &[replica.addr.as_str()], &options())
        .await
        .unwrap();
    (master, replica, pool)
}

#[tokio::test]
async fn test_geo_requires_3_2() {
    let (server, pool) = pool_replying("3.0.7", int(1)).await;

    assert!(matches!(
        pool.geoadd("g", &[(13.361389, 38.115556, "Palermo")]).await,
        Err(Error::NotSupported { command: "GEOADD", .. })
    ));
    assert!(matches!(
        pool.georadius("g", 15.0, 37.0, 200.0, GeoUnit::Kilometers, &GeoRadiusOptions::default())
            .await,
        Err(Error::NotSupported { .. })
    ));
    assert!(server.commands().is_empty());
}

#[tokio::test]
async fn test_geoadd_args() {
    let (server, pool) = pool_replying("3.2.0", int(2)).await;

    let added = pool
        .geoadd("g", &[(13.5, 38.25, "Palermo"), (15.0, 37.5, "Catania")])
        .await
        .unwrap();

    assert_eq!(added, 2);
    assert_eq!(
        server.last(),
        args(&["GEOADD", "g", "13.5", "38.25", "Palermo", "15", "37.5", "Catania"])
    );
}

#[tokio::test]
async fn test_geodist_unit_and_missing() {
    let (server, pool) = pool_with("3.2.0", |cmd| match cmd[3].as_str() {
        "Ghost" => nil(),
        _ => bulk("166.2742"),
    })
    .await;

    assert_eq!(
        pool.geodist("g", "Palermo", "Catania", Some(GeoUnit::Kilometers))
            .await
            .unwrap(),
        Some(166.2742)
    );
    assert_eq!(
        server.last(),
        args(&["GEODIST", "g", "Palermo", "Catania", "km"])
    );
    assert_eq!(
        pool.geodist("g", "Palermo", "Ghost", None).await.unwrap(),
        None
    );
    assert_eq!(server.last(), args(&["GEODIST", "g", "Palermo", "Ghost"]));
}

#[tokio::test]
async fn test_geohash_and_geopos_missing_members() {
    let (_server, pool) = pool_with("3.2.0", |cmd| match cmd[0].as_str() {
        "GEOHASH" => array(vec![bulk("sqc8b49rny0"), nil()]),
        _ => array(vec![array(vec![bulk("13.5"), bulk("38.25")]), Frame::Null]),
    })
    .await;

    assert_eq!(
        pool.geohash("g", &["Palermo", "Ghost"]).await.unwrap(),
        vec![Some("sqc8b49rny0".to_string()), None]
    );
    assert_eq!(
        pool.geopos("g", &["Palermo", "Ghost"]).await.unwrap(),
        vec![Some((13.5, 38.25)), None]
    );
}

#[tokio::test]
async fn test_georadius_on_3_2_0_uses_master() {
    let (master, replica, pool) = master_and_replica("3.2.0").await;
    let options = GeoRadiusOptions {
        with_dist: true,
        with_coord: true,
        count: Some(5),
        ascending: Some(true),
        ..GeoRadiusOptions::default()
    };

    pool.georadius("g", 15.0, 37.0, 200.0, GeoUnit::Kilometers, &options)
        .await
        .unwrap();

    assert_eq!(
        master.last(),
        args(&[
            "GEORADIUS", "g", "15", "37", "200", "km", "WITHCOORD", "WITHDIST", "COUNT", "5",
            "ASC"
        ])
    );
    assert!(replica.commands().is_empty());
}

#[tokio::test]
async fn test_georadius_ro_on_replica() {
    let (master, replica, pool) = master_and_replica("3.2.10").await;
    let options = GeoRadiusOptions {
        with_dist: true,
        with_coord: true,
        ..GeoRadiusOptions::default()
    };

    let found = pool
        .georadius_by_member("g", "Agrigento", 100.0, GeoUnit::Kilometers, &options)
        .await
        .unwrap();

    assert_eq!(
        replica.last(),
        args(&[
            "GEORADIUSBYMEMBER_RO", "g", "Agrigento", "100", "km", "WITHCOORD", "WITHDIST"
        ])
    );
    assert!(master.commands().is_empty());
    assert_eq!(
        found,
        vec![GeoMember {
            name: "Palermo".into(),
            dist: Some(190.4424),
            hash: None,
            coord: Some((13.36138933897018433, 38.11555639549629859)),
        }]
    );
}

#[tokio::test]
async fn test_georadius_plain_names() {
    let (_server, pool) =
        pool_replying("3.2.10", array(vec![bulk("Palermo"), bulk("Catania")])).await;

    let found = pool
        .georadius("g", 15.0, 37.0, 200.0, GeoUnit::Meters, &GeoRadiusOptions::default())
        .await
        .unwrap();

    let names: Vec<_> = found.into_iter().map(|m| m.name).collect();
    assert_eq!(names, vec!["Palermo", "Catania"]);
}

#[tokio::test]
async fn test_georadius_with_hash() {
    let (_server, pool) = pool_replying(
        "3.2.10",
        array(vec![array(vec![bulk("Palermo"), int(3479099956230698)])]),
    )
    .await;
    let options = GeoRadiusOptions {
        with_hash: true,
        ..GeoRadiusOptions::default()
    };

    let found = pool
        .georadius("g", 15.0, 37.0, 200.0, GeoUnit::Miles, &options)
        .await
        .unwrap();
    assert_eq!(found[0].hash, Some(3479099956230698));
    assert_eq!(found[0].dist, None);
}
