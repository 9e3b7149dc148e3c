use argparse::{ArgumentParser, Store, StoreOption, StoreTrue};
use lowdown::{Certificate, Client, Notification};
use serde_json::json;
use std::fs::File;

// An example client connecting to APNs with a certificate and key
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    tracing_subscriber::fmt().init();

    let mut certificate_file = String::new();
    let mut password: Option<String> = None;
    let mut device_token = String::new();
    let mut message = String::from("Ch-check it out!");
    let mut production = false;
    let mut topic: Option<String> = None;

    {
        let mut ap = ArgumentParser::new();
        ap.set_description("APNs certificate-based push");
        ap.refer(&mut certificate_file).add_option(
            &["-c", "--certificate"],
            Store,
            "Certificate file location, PEM or PKCS12 if a password is given",
        );
        ap.refer(&mut password)
            .add_option(&["-p", "--password"], StoreOption, "Certificate password");
        ap.refer(&mut device_token)
            .add_option(&["-d", "--device_token"], Store, "APNs device token");
        ap.refer(&mut message)
            .add_option(&["-m", "--message"], Store, "Notification message");
        ap.refer(&mut production).add_option(
            &["--production"],
            StoreTrue,
            "Use the production APNs servers",
        );
        ap.refer(&mut topic)
            .add_option(&["-o", "--topic"], StoreOption, "APNS topic");
        ap.parse_args_or_exit();
    }

    let certificate = match password {
        Some(ref password) => Certificate::from_pkcs12(&mut File::open(&certificate_file)?, password)?,
        None => Certificate::from_pem(&std::fs::read(&certificate_file)?)?,
    };

    println!("Default topic: {:?}", certificate.default_topic());

    let mut client = Client::production(production, certificate)?;

    let mut notification = Notification::new(device_token, json!({ "alert": message, "sound": "default", "badge": 1 }))?;
    notification.topic = topic;

    // Send the notification, parse response
    let response = client
        .connect(|client| Box::pin(async move { client.send_notification(&notification).await }))
        .await?;

    println!("Sent: {:?}", response);

    Ok(())
}
