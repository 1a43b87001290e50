use criterion::{criterion_group, criterion_main, Criterion};
use rust_decimal::Decimal;
use sim_core::{ActionKind, CampaignConfig, TurnRecord, UnitKind, UserCommand};
use sim_runtime::{Campaign, ScriptedUser};

fn bench_campaign(c: &mut Criterion) {
    let mut cfg = CampaignConfig::default();
    cfg.max_quarters = 40;
    cfg.win_share = 99.0;
    cfg.loss_share = 1.0;
    let command = UserCommand::from_percentages(
        ActionKind::Invest,
        Decimal::new(200, 0),
        &[(UnitKind::Sales, 50), (UnitKind::RnD, 50)],
    );
    c.bench_function("campaign_40_quarters", |b| {
        b.iter(|| {
            let mut campaign = match Campaign::new(cfg.clone()) {
                Ok(c) => c,
                Err(e) => panic!("bench config rejected: {e}"),
            };
            let mut user = ScriptedUser::repeating(command.clone(), 40);
            let _ = campaign.run(&mut user, &mut |_: &TurnRecord| {});
        })
    });
}

criterion_group!(benches, bench_campaign);
criterion_main!(benches);
