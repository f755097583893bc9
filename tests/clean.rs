use std::fs;

use ctf_fills::{
    csv_io,
    fill::{TradeMetadata, TradeProcessor},
    num::Converter,
    reconcile,
    resolve::{self, ConditionSource, ResolverInput, TokenSource},
    types::{Outcome, Perspective, Side},
};
use fastnum::udec256;

const YES: &str = "73817598408230683831072353847770809458837920203753987347670649717002095543451";
const NO: &str = "102505737677514435038431832532030540090751572260157019042399710777845176913904";

fn fills_csv() -> String {
    [
        "id,timestamp,transactionHash,maker,taker,makerAssetId,makerAmountFilled,takerAssetId,takerAmountFilled,fee",
        // Taker buys 10 Yes in two partial fills
        &format!("a1,1700000100,0xaa,0xm1,0xt1,{YES},6000000,0,3600000,0"),
        &format!("a2,1700000100,0xaa,0xm2,0xt1,{YES},4000000,0,2400000,0"),
        // Taker sells 5 No
        &format!("b1,1700000200,0xbb,0xm1,0xt2,0,2000000,{NO},5000000,0"),
        // Round trip on Yes, nets to zero
        &format!("c1,1700000300,0xcc,0xm1,0xt3,{YES},1000000,0,500000,0"),
        &format!("c2,1700000301,0xcc,0xm2,0xt3,0,600000,{YES},1000000,0"),
        // Token for token, ignored
        &format!("d1,1700000400,0xdd,0xm1,0xt4,{YES},1000000,{NO},1000000,0"),
    ]
    .join("\n")
}

/// Runs the whole CSV to CSV pipeline on temporary files.
#[test]
fn test_clean_fills_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("fills.csv");
    let output = dir.path().join("trades.csv");
    fs::write(&input, fills_csv()).unwrap();

    let fills = csv_io::read_fills_file(&input, Converter::default()).unwrap();
    assert_eq!(fills.len(), 6);

    let resolver_input = ResolverInput {
        infer: true,
        ..Default::default()
    };
    let (market, source) = resolve::resolve_market(&resolver_input, &fills).unwrap();
    assert_eq!(source, TokenSource::Inferred);
    assert_eq!(market.yes_token().as_str(), YES);
    assert_eq!(market.no_token().as_str(), NO);

    let metadata = TradeMetadata {
        title: "Mayor".to_string(),
        slug: "mayor".to_string(),
        event_slug: "nyc".to_string(),
    };
    let trades = TradeProcessor::new(market, Perspective::Taker, metadata)
        .process(fills)
        .unwrap();
    assert_eq!(trades.len(), 2);

    let sell = &trades[0];
    assert_eq!(sell.tx_hash, "0xbb");
    assert_eq!((sell.side, sell.outcome), (Side::Sell, Outcome::No));
    assert_eq!(sell.size, udec256!(5));
    assert_eq!(sell.price, Some(udec256!(0.4)));
    assert_eq!(sell.proxy_wallet, "0xt2");

    let buy = &trades[1];
    assert_eq!(buy.tx_hash, "0xaa");
    assert_eq!((buy.side, buy.outcome), (Side::Buy, Outcome::Yes));
    assert_eq!(buy.size, udec256!(10));
    assert_eq!(buy.volume, udec256!(6));

    csv_io::write_trades_file(&output, &trades).unwrap();
    let written = fs::read_to_string(&output).unwrap();
    let lines: Vec<_> = written.lines().collect();
    assert_eq!(lines.len(), 3);
    assert_eq!(
        lines[1],
        format!("1700000200,2023-11-14 22:16:40+00:00,SELL,No,0.4,5,2,0xbb,{NO},0xt2,Mayor,mayor,nyc")
    );

    // Canonical output reconciles perfectly with itself
    let records = csv_io::read_trade_records_file(&output).unwrap();
    let report = reconcile::reconcile(&records, &records, reconcile::DEFAULT_MAX_MISMATCHES);
    assert_eq!(report.groups, 2);
    assert_eq!(report.price_accuracy(), Some(100.0));
    assert!(report.mismatches.is_empty());
}

#[test]
fn test_maker_perspective_mirrors_taker() {
    let fills = csv_io::read_fills(fills_csv().as_bytes(), Converter::default()).unwrap();
    let input = ResolverInput {
        yes_token: Some(YES.to_string()),
        no_token: Some(NO.to_string()),
        ..Default::default()
    };
    let (market, source) = resolve::resolve_market(&input, &fills).unwrap();
    assert_eq!(source, TokenSource::Explicit);

    let taker = TradeProcessor::new(market.clone(), Perspective::Taker, TradeMetadata::default())
        .process(fills.clone())
        .unwrap();
    let maker = TradeProcessor::new(market, Perspective::Maker, TradeMetadata::default())
        .process(fills)
        .unwrap();

    assert_eq!(taker.len(), maker.len());
    for (t, m) in taker.iter().zip(&maker) {
        assert_ne!(t.side, m.side);
        assert_eq!(t.size, m.size);
        assert_eq!(t.volume, m.volume);
    }
    // Wallet of the earliest fill of the transaction
    assert_eq!(maker[1].proxy_wallet, "0xm1");
}

#[test]
fn test_derived_tokens_from_condition() {
    let input = ResolverInput {
        condition: Some(ConditionSource::new(
            "0x6220c4164a293367cd40eba018dd6e67c78e4d48e74158845cc9361230bcb34d",
            "0x2791Bca1f2de4661ED88A30C99A7a9449Aa84174",
        )),
        infer: true,
        ..Default::default()
    };
    let (market, source) = resolve::resolve_market(&input, &[]).unwrap();
    assert_eq!(source, TokenSource::Derived);
    assert_eq!(
        market.yes_token().as_str(),
        "2722615849211243136625834175054300471013059855529861991273106456860591338202"
    );
    assert_eq!(
        market.no_token().as_str(),
        "106622758803168654614267234504855485892384817505162080804835781654284445124682"
    );
}
