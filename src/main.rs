use podwatch::config::{AppConfig, NotifierConfig};
use podwatch::event::WatchStreamSource;
use podwatch::monitoring::{
    join_notify_worker, spawn_notify_worker, Dispatcher, Notifier, TelegramNotifier,
};
use podwatch::resource::Pod;
use podwatch::shutdown::shutdown_signal;
use podwatch::utils::init_logging;
use tokio::io::BufReader;

#[tokio::main]
async fn main() {
    // 1. 환경변수 로드
    dotenvy::dotenv().ok();

    // 2. 로깅 초기화 (guard는 종료 시까지 유지)
    let log_guard = init_logging();

    // 3. 설정 로드
    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "Invalid configuration");
            std::process::exit(1);
        }
    };

    // 4. 알림 채널 준비
    let notifier: Box<dyn Notifier> = match &config.notifier {
        NotifierConfig::Telegram {
            token,
            chat_id,
            api_base,
        } => {
            let telegram = TelegramNotifier::with_api_base(token.clone(), *chat_id, api_base.clone());
            if let Err(e) = telegram.authorize().await {
                tracing::error!(error_code = e.error_code(), error = %e, "Telegram authorization failed");
                std::process::exit(1);
            }
            Box::new(telegram)
        }
        other => other.build(),
    };

    tracing::info!(
        notifier = config.notifier.name(),
        destination = %notifier.destination(),
        queue_capacity = config.queue_capacity,
        namespaces = ?config.filter.namespaces(),
        ignored_namespaces = ?config.filter.ignored_namespaces(),
        enabled_kinds = ?config.filter.enabled_kinds(),
        "Starting podwatch"
    );

    let (handle, worker) = spawn_notify_worker(notifier, config.queue_capacity, config.retry.clone());
    let dispatcher = Dispatcher::<Pod>::new(handle, config.filter.clone());

    // 5. 워치 스트림(stdin) 처리
    let mut source = WatchStreamSource::<Pod, _>::new(BufReader::new(tokio::io::stdin()));

    tokio::select! {
        stats = dispatcher.run(&mut source) => {
            tracing::info!(total = stats.total(), "Watch stream closed");
        }
        _ = shutdown_signal() => {}
    }

    // 6. 큐 닫고 남은 알림 전송 대기
    drop(dispatcher);
    match join_notify_worker(worker).await {
        Ok(stats) => tracing::info!(
            delivered = stats.delivered,
            failed = stats.failed,
            decode_failures = source.decode_failures(),
            "Shutdown complete"
        ),
        Err(e) => tracing::error!(error_code = e.error_code(), error = %e, "Notifications may be lost"),
    }

    // 블로킹 stdin 읽기는 취소할 수 없으므로 런타임 종료를 기다리지 않음
    drop(log_guard);
    std::process::exit(0);
}
