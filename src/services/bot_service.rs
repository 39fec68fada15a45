use std::time::Duration;

use chrono::NaiveDate;
use sqlx::SqlitePool;
use tracing::{error, info, warn};

use crate::external::notifier::NotifierError;
use crate::external::telegram::{TelegramClient, Update, LONG_POLL_SECS};
use crate::models::{Direction, NewPrediction, TrackedAsset};
use crate::services::prediction_service;

const ADD_USAGE: &str = "사용법: /add [자산] [날짜 YYYY-MM-DD] [가격] [UP/DOWN]\n예시: /add S&P500 2024-01-15 4500 UP";
const RETRY_DELAY: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, PartialEq)]
pub enum BotCommand {
    Start,
    Add(Vec<String>),
    Status,
}

/// Parses `/command[@bot] args...`. Anything else (plain chat, unknown
/// commands) is ignored.
pub fn parse_command(text: &str) -> Option<BotCommand> {
    let mut parts = text.split_whitespace();
    let head = parts.next()?.strip_prefix('/')?;
    let name = head.split('@').next().unwrap_or(head);
    let args: Vec<String> = parts.map(str::to_string).collect();

    match name {
        "start" => Some(BotCommand::Start),
        "add" => Some(BotCommand::Add(args)),
        "status" => Some(BotCommand::Status),
        _ => None,
    }
}

/// Validates `/add` arguments into a prediction, or returns the reply that
/// explains what is wrong.
pub fn parse_add_args(args: &[String]) -> Result<NewPrediction, String> {
    let [asset, date, price, direction, ..] = args else {
        return Err(ADD_USAGE.to_string());
    };

    if TrackedAsset::from_display_name(asset).is_none() {
        return Err(format!("유효한 자산: {}", TrackedAsset::display_names().join(", ")));
    }

    let direction: Direction = direction
        .to_uppercase()
        .parse()
        .map_err(|_| "방향성은 UP 또는 DOWN 이어야 합니다".to_string())?;

    let mention_price = price
        .replace(',', "")
        .parse::<f64>()
        .ok()
        .filter(|p| p.is_finite() && *p > 0.0)
        .ok_or_else(|| format!("입력 오류: 가격 '{}' 이(가) 올바르지 않습니다", price))?;

    let mention_date = NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .map_err(|e| format!("입력 오류: 날짜 '{}' ({})", date, e))?;

    Ok(NewPrediction {
        asset_market: asset.clone(),
        ticker: None,
        mention_date,
        mention_price,
        direction,
    })
}

/// `1234567.891` -> `1,234,567.89`
pub fn format_price(value: f64) -> String {
    let fixed = format!("{:.2}", value.abs());
    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let sign = if value < 0.0 { "-" } else { "" };
    format!("{}{}.{}", sign, grouped, frac_part)
}

fn start_text() -> String {
    format!(
        "🥔 알감자지수 봇에 오신 걸 환영합니다!\n\n📌 명령어 안내\n/add [자산] [날짜] [가격] [방향]\n\
         예시: /add S&P500 2024-01-15 4500 UP\n\n✅ 사용 가능한 자산:\n{}",
        TrackedAsset::display_names().join("\n")
    )
}

#[derive(Clone)]
pub struct BotContext {
    pub pool: SqlitePool,
    /// Telegram user ids allowed to add predictions.
    pub admin_ids: Vec<i64>,
}

impl BotContext {
    fn is_operator(&self, user_id: Option<i64>) -> bool {
        user_id.is_some_and(|id| self.admin_ids.contains(&id))
    }

    /// Runs one command and returns the reply text.
    pub async fn handle(&self, user_id: Option<i64>, command: BotCommand) -> String {
        match command {
            BotCommand::Start => start_text(),
            BotCommand::Add(args) => self.add(user_id, &args).await,
            BotCommand::Status => self.status().await,
        }
    }

    async fn add(&self, user_id: Option<i64>, args: &[String]) -> String {
        if !self.is_operator(user_id) {
            warn!("Refused /add from non-operator {:?}", user_id);
            return "⛔ 권한이 없습니다".to_string();
        }

        let new = match parse_add_args(args) {
            Ok(new) => new,
            Err(reply) => return reply,
        };

        match prediction_service::insert(&self.pool, &new).await {
            Ok(p) => {
                let arrow = match p.direction {
                    Direction::Up => "📈",
                    Direction::Down => "📉",
                };
                format!(
                    "✅ 추가 완료!\n자산: {}\n날짜: {}\n가격: {}\n방향: {} {}",
                    p.asset_market,
                    p.mention_date,
                    format_price(p.mention_price),
                    arrow,
                    p.direction
                )
            }
            Err(e) => format!("DB 오류: {}", e),
        }
    }

    async fn status(&self) -> String {
        match prediction_service::status(&self.pool).await {
            Ok((totals, count)) => format!(
                "📊 현재 알감자지수 현황\n총 예측: {}건\n✅ 적중: {}  ❌ 실패: {}\n🥔 알감자지수: {:.1}%",
                count,
                totals.total_hit,
                totals.total_miss,
                totals.report_index()
            ),
            Err(e) => format!("DB 오류: {}", e),
        }
    }
}

fn is_conflict(e: &NotifierError) -> bool {
    matches!(e, NotifierError::Api(description) if description.contains("Conflict"))
}

/// Long-polling loop. Updates queued while the bot was offline are skipped.
/// Returns only if another instance is already polling with the same token.
pub async fn run_bot(ctx: BotContext, api: TelegramClient) {
    let mut offset = match api.get_updates(-1, 0).await {
        Ok(pending) => pending.last().map(|u| u.update_id + 1).unwrap_or(0),
        Err(e) if is_conflict(&e) => {
            error!("Telegram bot disabled - another instance is already polling: {}", e);
            return;
        }
        Err(e) => {
            warn!("Could not drop pending Telegram updates: {}", e);
            0
        }
    };

    info!("🤖 Telegram bot polling started");
    loop {
        let updates = match api.get_updates(offset, LONG_POLL_SECS).await {
            Ok(updates) => updates,
            Err(e) if is_conflict(&e) => {
                error!("Telegram bot stopped - another instance is polling: {}", e);
                return;
            }
            Err(e) => {
                warn!("Telegram polling error: {}", e);
                tokio::time::sleep(RETRY_DELAY).await;
                continue;
            }
        };

        for update in updates {
            offset = offset.max(update.update_id + 1);
            dispatch(&ctx, &api, update).await;
        }
    }
}

async fn dispatch(ctx: &BotContext, api: &TelegramClient, update: Update) {
    let Some(message) = update.message else { return };
    let Some(command) = message.text.as_deref().and_then(parse_command) else {
        return;
    };

    let user_id = message.from.map(|u| u.id);
    info!("🤖 Bot command {:?} from {:?}", command, user_id);
    let reply = ctx.handle(user_id, command).await;

    if let Err(e) = api.send_message(&message.chat.id.to_string(), &reply, None).await {
        error!("Failed to reply to chat {}: {}", message.chat.id, e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;

    fn args(s: &str) -> Vec<String> {
        s.split_whitespace().map(str::to_string).collect()
    }

    async fn ctx(admin_ids: Vec<i64>) -> BotContext {
        BotContext { pool: db::connect_in_memory().await.unwrap(), admin_ids }
    }

    #[test]
    fn parses_commands_with_bot_suffix() {
        assert_eq!(parse_command("/start"), Some(BotCommand::Start));
        assert_eq!(parse_command("/status@algamja_bot"), Some(BotCommand::Status));
        assert_eq!(
            parse_command("/add KOSPI 2024-01-15 2500 up"),
            Some(BotCommand::Add(args("KOSPI 2024-01-15 2500 up")))
        );
        assert_eq!(parse_command("hello"), None);
        assert_eq!(parse_command("/unknown"), None);
        assert_eq!(parse_command(""), None);
    }

    #[test]
    fn add_args_validation() {
        let ok = parse_add_args(&args("S&P500 2024-01-15 4,500 up")).unwrap();
        assert_eq!(ok.asset_market, "S&P500");
        assert_eq!(ok.mention_price, 4500.0);
        assert_eq!(ok.direction, Direction::Up);

        assert_eq!(parse_add_args(&args("KOSPI 2024-01-15")).unwrap_err(), ADD_USAGE);
        assert!(parse_add_args(&args("AAPL 2024-01-15 190 UP")).unwrap_err().starts_with("유효한 자산"));
        assert!(parse_add_args(&args("KOSPI 2024-01-15 2500 FLAT")).unwrap_err().contains("UP 또는 DOWN"));
        assert!(parse_add_args(&args("KOSPI 15/01/2024 2500 UP")).is_err());
        assert!(parse_add_args(&args("KOSPI 2024-01-15 -1 UP")).is_err());
    }

    #[test]
    fn formats_prices_with_grouping() {
        assert_eq!(format_price(4500.0), "4,500.00");
        assert_eq!(format_price(1234567.891), "1,234,567.89");
        assert_eq!(format_price(999.5), "999.50");
        assert_eq!(format_price(0.0), "0.00");
    }

    #[tokio::test]
    async fn only_operators_can_add() {
        let bot = ctx(vec![42]).await;

        let refused = bot.handle(Some(7), BotCommand::Add(args("KOSPI 2024-01-15 2500 UP"))).await;
        assert!(refused.contains("권한"));
        let refused = bot.handle(None, BotCommand::Add(args("KOSPI 2024-01-15 2500 UP"))).await;
        assert!(refused.contains("권한"));

        let added = bot.handle(Some(42), BotCommand::Add(args("KOSPI 2024-01-15 2500 UP"))).await;
        assert!(added.starts_with("✅ 추가 완료!"));
        assert!(added.contains("가격: 2,500.00"));
        assert!(added.contains("방향: 📈 UP"));
    }

    #[tokio::test]
    async fn empty_operator_list_refuses_everyone() {
        let bot = ctx(vec![]).await;
        let reply = bot.handle(Some(42), BotCommand::Add(args("KOSPI 2024-01-15 2500 UP"))).await;
        assert!(reply.contains("권한"));
    }

    #[tokio::test]
    async fn status_reports_counts_and_index() {
        let bot = ctx(vec![1]).await;
        bot.handle(Some(1), BotCommand::Add(args("금 2024-01-15 2000 DOWN"))).await;
        let listing = prediction_service::list(&bot.pool).await.unwrap();
        db::prediction_queries::set_counters(&bot.pool, listing.predictions[0].id, Some(2), Some(1))
            .await
            .unwrap();

        let reply = bot.handle(None, BotCommand::Status).await;
        assert!(reply.contains("총 예측: 1건"));
        assert!(reply.contains("✅ 적중: 2  ❌ 실패: 1"));
        assert!(reply.contains("🥔 알감자지수: 66.7%"));
    }

    #[tokio::test]
    async fn start_lists_tracked_assets() {
        let bot = ctx(vec![]).await;
        let reply = bot.handle(None, BotCommand::Start).await;
        for name in TrackedAsset::display_names() {
            assert!(reply.contains(name));
        }
    }
}
