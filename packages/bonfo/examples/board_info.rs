use bonfo::{
    protocol::schemas::{self, StatusEx},
    BoardSession, SessionConfig,
};

#[tokio::main]
async fn main() {
    simplelog::TermLogger::init(
        log::LevelFilter::Debug,
        simplelog::Config::default(),
        simplelog::TerminalMode::Mixed,
        simplelog::ColorChoice::Always,
    )
    .unwrap();

    let device = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "/dev/ttyACM0".to_string());

    // Open the flight controller and wait for it to identify itself
    let session = BoardSession::serial(SessionConfig::new(device).with_trials(5));
    session.wait_ready().await.unwrap();

    let identity = session.identity().unwrap();
    println!("API version: {}", identity.api_version);
    if let Some(variant) = &identity.variant {
        println!("Firmware: {}", variant.0);
    }
    if let Some(firmware) = &identity.firmware {
        println!("Release: {firmware}");
    }
    if let Some(uid) = &identity.uid {
        println!("UID: {uid}");
    }

    let status = session.get(&schemas::STATUS_EX).await.unwrap();
    let status = StatusEx::try_from(&status.record).unwrap();
    println!("{status:#?}");

    // Peek at the rates on the second rate profile, then switch back
    let tuning = session
        .with_profile(None, Some(2), true, |session| async move {
            session.get(&schemas::RC_TUNING).await
        })
        .await
        .unwrap();

    for (name, value) in tuning.record.iter() {
        println!("{name}: {value:?}");
    }
}
