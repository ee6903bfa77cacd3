use geoforge::{Factory, GeoforgeError, GeometryKind, encode_hex};

const MIXED_COLLECTION: &str = "GEOMETRYCOLLECTION (POLYGON ((0 0, 0 90, 90 90, 90 0, 0 0)), \
     POLYGON ((120 0, 120 90, 210 90, 210 0, 120 0)), \
     LINESTRING (40 50, 40 140), \
     POINT (60 50), \
     POINT (40 140))";

#[test]
fn test_wkt_round_trip() {
    let factory = Factory::new();
    let geom = factory.parse_wkt(MIXED_COLLECTION).unwrap();
    assert_eq!(geom.geometry_type(), Some(GeometryKind::Collection));

    let text = geom.as_text().unwrap().unwrap();
    let again = factory.parse_wkt(&text).unwrap();
    assert!(again.equals_exact(&geom));
}

#[test]
fn test_wkb_parser_inputs() {
    let factory = Factory::new();
    let c_factory = Factory::new();

    let geom = factory.parse_wkt(MIXED_COLLECTION).unwrap();
    let binary_wkb = geom.as_binary().unwrap().unwrap();
    let hexadecimal_wkb = encode_hex(&binary_wkb);

    // Raw bytes and hexadecimal text must produce the same geometry.
    let wkt = factory.parse_wkb(&binary_wkb).unwrap().as_text().unwrap();
    assert_eq!(
        wkt,
        factory
            .parse_wkb(hexadecimal_wkb.as_bytes())
            .unwrap()
            .as_text()
            .unwrap()
    );

    // And identically across two independently constructed factories.
    assert_eq!(
        wkt,
        c_factory.parse_wkb(&binary_wkb).unwrap().as_text().unwrap()
    );
    assert_eq!(
        wkt,
        c_factory
            .parse_wkb(hexadecimal_wkb)
            .unwrap()
            .as_text()
            .unwrap()
    );
}

#[test]
fn test_wkb_round_trip_preserves_structure() {
    let factory = Factory::new();
    let geom = factory
        .parse_wkt("POLYGON ((0 0, 0 10, 10 10, 10 0, 0 0), (2 2, 2 4, 4 4, 4 2, 2 2))")
        .unwrap();
    let wkb = geom.as_binary().unwrap().unwrap();
    let back = factory.parse_wkb(&wkb).unwrap();
    assert!(back.equals_exact(&geom));
    assert_eq!(back.geometry_type(), Some(GeometryKind::Polygon));
}

#[test]
fn test_parse_errors() {
    let factory = Factory::new();
    assert!(matches!(
        factory.parse_wkt("POINT (oops)"),
        Err(GeoforgeError::WktParse(_))
    ));
    assert!(matches!(
        factory.parse_wkb(b"" as &[u8]),
        Err(GeoforgeError::WkbParse(_))
    ));
    assert!(matches!(
        factory.parse_wkb(&[0x09u8, 0x00, 0x01][..]),
        Err(GeoforgeError::WkbParse(_))
    ));
}

#[test]
fn test_codec_state_snapshot() {
    let factory = Factory::new();

    // Codecs are lazy: a fresh factory decomposes into empty maps.
    let state = factory.codec_state();
    assert!(state.wkt_generator.is_empty());
    assert!(state.wkb_generator.is_empty());
    assert!(state.wkt_parser.is_empty());
    assert!(state.wkb_parser.is_empty());

    let json = serde_json::to_value(&state).unwrap();
    assert_eq!(json["wkt_generator"], serde_json::json!({}));
    assert_eq!(json["wkb_generator"], serde_json::json!({}));
    assert_eq!(json["wkt_parser"], serde_json::json!({}));
    assert_eq!(json["wkb_parser"], serde_json::json!({}));
}

#[test]
fn test_parsed_geometry_inherits_srid() {
    let factory = Factory::builder().srid(4326).build();
    let geom = factory.parse_wkt("POINT (1 2)").unwrap();
    assert_eq!(geom.srid(), 4326);
    assert_eq!(geom.factory().srid(), 4326);
}

#[test]
fn test_hex_detection_boundaries() {
    let factory = Factory::new();
    let point = factory.point(7.0, 8.0);
    let wkb = point.as_binary().unwrap().unwrap();

    // Uppercase hex decodes the same as lowercase.
    let upper = encode_hex(&wkb).to_uppercase();
    let parsed = factory.parse_wkb(upper.as_bytes()).unwrap();
    assert!(parsed.equals_exact(&point));

    // Odd-length input cannot be hex and fails as raw bytes.
    let mut odd = encode_hex(&wkb);
    odd.pop();
    assert!(factory.parse_wkb(odd.as_bytes()).is_err());
}
