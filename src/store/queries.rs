/// 경매 생성
pub const INSERT_AUCTION: &str = r#"
    INSERT INTO auctions
        (title, description, item_image, base_price, current_price, start_time,
         status, created_by, participants, registrations, created_at)
    VALUES ($1, $2, $3, $4, $4, $5, 'upcoming', $6, ARRAY[$6]::BIGINT[], '{}', $7)
    RETURNING *
"#;

/// 경매 조회
pub const GET_AUCTION: &str = "SELECT * FROM auctions WHERE id = $1";

/// 모든 경매 조회
pub const LIST_AUCTIONS: &str = "SELECT * FROM auctions ORDER BY created_at DESC";

/// 소유자 일정 충돌 검사
pub const OWNER_SCHEDULE_CONFLICT: &str = r#"
    SELECT EXISTS(
        SELECT 1 FROM auctions
        WHERE created_by = $1 AND start_time BETWEEN $2 AND $3
    ) AS conflict
"#;

/// 시작 시각이 지난 upcoming 경매를 active로 전이 (조건부 갱신)
pub const PROMOTE_DUE_AUCTIONS: &str = r#"
    UPDATE auctions SET status = 'active'
    WHERE status = 'upcoming' AND start_time <= $1
    RETURNING *
"#;

/// 시작 전 참가 신청 (upcoming + 미신청인 경우에만)
pub const REGISTER_INTEREST: &str = r#"
    UPDATE auctions SET registrations = array_append(registrations, $2)
    WHERE id = $1 AND status = 'upcoming' AND NOT ($2 = ANY(registrations))
    RETURNING *
"#;

/// 입찰 커밋: 저장된 현재 가격보다 높은 경우에만 가격 인상 + 참가자 추가
/// (compare-and-set, 두 동시 입찰 중 하나만 통과한다)
pub const COMMIT_BID_RAISE_PRICE: &str = r#"
    UPDATE auctions SET
        current_price = $2,
        participants = CASE
            WHEN $3 = ANY(participants) THEN participants
            ELSE array_append(participants, $3)
        END
    WHERE id = $1 AND status = 'active' AND current_price < $2
    RETURNING *
"#;

/// 입찰 기록 추가
pub const INSERT_BID: &str = r#"
    INSERT INTO bids (auction_id, bidder_id, amount, bid_time)
    VALUES ($1, $2, $3, $4)
    RETURNING *
"#;

/// 경매 종료 (아직 종료되지 않은 경우에만)
pub const CLOSE_AUCTION: &str = r#"
    UPDATE auctions SET status = 'ended', winner = $2, winning_bid = $3
    WHERE id = $1 AND status <> 'ended'
    RETURNING *
"#;

/// 입찰 이력 조회 (금액 내림차순, 동률은 먼저 기록된 순)
pub const BIDS_FOR_AUCTION: &str = r#"
    SELECT id, auction_id, bidder_id, amount, bid_time
    FROM bids
    WHERE auction_id = $1
    ORDER BY amount DESC, bid_time ASC, id ASC
"#;

/// 최고 입찰 조회
pub const HIGHEST_BID: &str = r#"
    SELECT id, auction_id, bidder_id, amount, bid_time
    FROM bids
    WHERE auction_id = $1
    ORDER BY amount DESC, bid_time ASC, id ASC
    LIMIT 1
"#;

/// 사용자 생성
pub const INSERT_USER: &str = r#"
    INSERT INTO users (username, email, created_at)
    VALUES ($1, $2, $3)
    RETURNING *
"#;

/// 사용자 조회
pub const GET_USER: &str = "SELECT * FROM users WHERE id = $1";

/// 이메일로 사용자 조회
pub const FIND_USER_BY_EMAIL: &str = "SELECT * FROM users WHERE email = $1";

/// 낙찰 기록 추가
pub const INSERT_WON_AUCTION: &str = r#"
    INSERT INTO won_auctions (user_id, auction_id, amount, won_at)
    VALUES ($1, $2, $3, $4)
    RETURNING *
"#;

/// 낙찰 이력 조회
pub const WON_AUCTIONS: &str = r#"
    SELECT id, user_id, auction_id, amount, won_at
    FROM won_auctions
    WHERE user_id = $1
    ORDER BY won_at DESC
"#;
