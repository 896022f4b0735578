//! Command router integration tests over an in-memory store.

use std::sync::Arc;

use bjcasino::security::SESSION_TTL;
use bjcasino::vault::STARTING_BALANCE;
use bjcasino::{Auth, Card, Game, GamePhase, Session, Suit, Vault};

const USER: &str = "alice";
const PASSWORD: &str = "hunter22";

const fn card(suit: Suit, rank: u8) -> Card {
    Card::new(suit, rank)
}

fn casino_with(vault: Arc<Vault>, deck: Vec<Card>) -> Session {
    let auth = Auth::new(vault, SESSION_TTL);
    Session::with_game_factory(auth, Box::new(move || Game::with_deck(&deck)))
}

fn send(session: &mut Session, line: &str) -> String {
    session.handle_line(line).unwrap().text
}

/// Signs up and logs in `alice`, dealing `deck` for every round.
fn logged_in(deck: Vec<Card>) -> (Session, Arc<Vault>, i64) {
    let vault = Arc::new(Vault::open_in_memory(STARTING_BALANCE).unwrap());
    let mut session = casino_with(Arc::clone(&vault), deck);
    assert!(send(&mut session, &format!("SIGNUP {USER} {PASSWORD}")).starts_with("OK"));
    assert!(send(&mut session, &format!("LOGIN {USER} {PASSWORD}")).starts_with("OK"));
    let id = vault.account_by_username(USER).unwrap().id;
    (session, vault, id)
}

/// Player 8+7 against dealer 6+10, then a 5 for whoever draws.
fn fifteen_vs_sixteen() -> Vec<Card> {
    vec![
        card(Suit::Hearts, 8),
        card(Suit::Clubs, 6),
        card(Suit::Diamonds, 7),
        card(Suit::Spades, 10),
        card(Suit::Hearts, 5),
    ]
}

/// Player 10+9 against dealer 10+7.
fn nineteen_vs_seventeen() -> Vec<Card> {
    vec![
        card(Suit::Hearts, 10),
        card(Suit::Clubs, 10),
        card(Suit::Diamonds, 9),
        card(Suit::Spades, 7),
    ]
}

#[test]
fn signup_login_and_whoami() {
    let vault = Arc::new(Vault::open_in_memory(STARTING_BALANCE).unwrap());
    let mut session = casino_with(vault, Vec::new());

    assert_eq!(
        send(&mut session, "SIGNUP alice hunter22"),
        "OK Account created for alice. Starting balance: $10000.00"
    );
    assert!(!session.is_logged_in());
    assert_eq!(
        send(&mut session, "login alice hunter22"),
        "OK Welcome, alice! Balance: $10000.00"
    );
    assert!(session.is_logged_in());
    assert_eq!(send(&mut session, "WHOAMI"), "OK Logged in as alice");
    assert_eq!(send(&mut session, "BALANCE"), "OK Balance: $10000.00");
}

#[test]
fn signup_and_login_failures() {
    let (mut session, _, _) = logged_in(Vec::new());

    assert_eq!(
        send(&mut session, "SIGNUP alice other_pw"),
        "ERROR username already exists"
    );
    assert_eq!(
        send(&mut session, "SIGNUP bob bob"),
        "ERROR password cannot be the same as username"
    );
    assert_eq!(
        send(&mut session, "SIGNUP b hunter22"),
        "ERROR username must be at least 2 characters long"
    );
    assert_eq!(
        send(&mut session, "LOGIN alice wrong_pw"),
        "ERROR invalid username or password"
    );
    assert_eq!(
        send(&mut session, "LOGIN nobody hunter22"),
        "ERROR invalid username or password"
    );
}

#[test]
fn commands_need_a_login() {
    let vault = Arc::new(Vault::open_in_memory(STARTING_BALANCE).unwrap());
    let mut session = casino_with(vault, fifteen_vs_sixteen());

    for line in ["BALANCE", "STATS", "WHOAMI", "BET 10", "HIT", "LOGOUT"] {
        assert_eq!(send(&mut session, line), "ERROR not logged in", "{line}");
    }
}

#[test]
fn unknown_and_malformed_commands() {
    let (mut session, _, _) = logged_in(Vec::new());

    assert_eq!(send(&mut session, "fold"), "ERROR unknown command: FOLD");
    assert_eq!(send(&mut session, "BET"), "ERROR usage: BET <amount>");
    assert_eq!(send(&mut session, "BET 1 2"), "ERROR usage: BET <amount>");
    assert_eq!(
        send(&mut session, "SIGNUP bob"),
        "ERROR usage: SIGNUP <username> <password>"
    );
    assert_eq!(
        send(&mut session, "LOGIN"),
        "ERROR usage: LOGIN <username> <password>"
    );
    assert!(session.handle_line("").is_none());
    assert!(session.handle_line("   \t").is_none());
    assert!(send(&mut session, "HELP").starts_with("OK Available commands:"));
}

#[test]
fn quit_closes_the_connection() {
    let vault = Arc::new(Vault::open_in_memory(STARTING_BALANCE).unwrap());
    let mut session = casino_with(vault, Vec::new());

    let reply = session.handle_line("QUIT").unwrap();
    assert_eq!(reply.text, "OK Goodbye!");
    assert!(reply.close);
    assert!(session.handle_line("exit").unwrap().close);
    assert!(!session.handle_line("HELP").unwrap().close);
}

#[test]
fn bad_bet_amounts() {
    let (mut session, vault, id) = logged_in(fifteen_vs_sixteen());

    assert_eq!(
        send(&mut session, "BET abc"),
        "ERROR invalid amount (use dollars, e.g. 10 or 12.50)"
    );
    assert_eq!(
        send(&mut session, "BET 1.005"),
        "ERROR invalid amount (use dollars, e.g. 10 or 12.50)"
    );
    assert_eq!(
        send(&mut session, "BET -5"),
        "ERROR invalid amount (use dollars, e.g. 10 or 12.50)"
    );
    assert_eq!(send(&mut session, "BET 0"), "ERROR amount must be positive");
    assert_eq!(send(&mut session, "BET 10000.01"), "ERROR insufficient funds");

    assert_eq!(vault.balance(id).unwrap(), STARTING_BALANCE);
    assert!(session.game().is_none());
}

#[test]
fn bet_escrows_the_stake_and_loss_keeps_it() {
    let (mut session, vault, id) = logged_in(fifteen_vs_sixteen());

    let reply = send(&mut session, "BET 10");
    assert_eq!(
        reply,
        "OK Game started!\nBet: $10.00\nPlayer Hand: [8♥] [7♦] (Value: 15)\nDealer Hand: [6♣] [Hidden]\nActions: HIT, STAND, DOUBLEDOWN, SURRENDER"
    );
    assert_eq!(vault.balance(id).unwrap(), STARTING_BALANCE - 1000);
    assert!(session.has_unfinished_game());

    let reply = send(&mut session, "STAND");
    assert!(reply.starts_with("OK\nBet: $10.00"), "{reply}");
    assert!(reply.contains("Dealer Hand: [6♣] [10♠] [5♥] (Value: 21)"));
    assert!(reply.ends_with("Result: Dealer wins.\nPayout: $0.00"));
    assert!(!reply.contains("Actions:"));
    assert_eq!(vault.balance(id).unwrap(), STARTING_BALANCE - 1000);

    let stats = vault.stats(id).unwrap();
    assert_eq!(stats.games_played, 1);
    assert_eq!(stats.games_lost, 1);
    assert_eq!(stats.total_bet, 1000);
    assert_eq!(stats.total_won, 0);
    assert_eq!(stats.biggest_loss, 1000);
}

#[test]
fn win_credits_double_the_stake() {
    let (mut session, vault, id) = logged_in(nineteen_vs_seventeen());

    send(&mut session, "BET $10.00");
    let reply = send(&mut session, "stand");
    assert!(reply.contains("Result: You win!\nPayout: $20.00"), "{reply}");
    assert_eq!(vault.balance(id).unwrap(), STARTING_BALANCE + 1000);
    assert_eq!(send(&mut session, "BALANCE"), "OK Balance: $10010.00");

    let stats = vault.stats(id).unwrap();
    assert_eq!(stats.games_won, 1);
    assert_eq!(stats.total_won, 2000);
    assert_eq!(stats.biggest_win, 1000);
}

#[test]
fn hit_keeps_round_open_and_shows_actions() {
    let (mut session, vault, id) = logged_in(fifteen_vs_sixteen());

    send(&mut session, "BET 10");
    let reply = send(&mut session, "HIT");
    assert!(reply.starts_with("OK\nBet: $10.00\nPlayer Hand: [8♥] [7♦] [5♥] (Value: 20)"));
    assert!(reply.ends_with("Actions: HIT, STAND"), "{reply}");
    assert_eq!(vault.stats(id).unwrap().games_played, 0);
}

#[test]
fn opening_blackjack_settles_at_once() {
    let deck = vec![
        card(Suit::Spades, 1),
        card(Suit::Hearts, 9),
        card(Suit::Clubs, 13),
        card(Suit::Diamonds, 7),
    ];
    let (mut session, vault, id) = logged_in(deck);

    let reply = send(&mut session, "BET 10");
    assert!(reply.starts_with("OK Game started!\n"));
    assert!(reply.contains("Result: Blackjack! You win!\nPayout: $25.00"));
    assert!(!reply.contains("Actions:"));
    assert_eq!(vault.balance(id).unwrap(), STARTING_BALANCE + 1500);
    assert!(!session.has_unfinished_game());

    // A finished round does not block the next one.
    assert!(send(&mut session, "BET 10").starts_with("OK Game started!"));
    assert_eq!(vault.balance(id).unwrap(), STARTING_BALANCE + 3000);
    assert_eq!(vault.stats(id).unwrap().games_won, 2);
}

#[test]
fn bet_during_round_is_refused() {
    let (mut session, vault, id) = logged_in(fifteen_vs_sixteen());

    send(&mut session, "BET 10");
    assert_eq!(
        send(&mut session, "BET 10"),
        "ERROR a game is already in progress"
    );
    assert_eq!(vault.balance(id).unwrap(), STARTING_BALANCE - 1000);
}

#[test]
fn actions_without_or_after_a_round() {
    let (mut session, _, _) = logged_in(nineteen_vs_seventeen());

    assert_eq!(
        send(&mut session, "HIT"),
        "ERROR no active game (use BET to start one)"
    );

    send(&mut session, "BET 10");
    send(&mut session, "STAND");
    assert_eq!(
        send(&mut session, "HIT"),
        "ERROR cannot hit in current phase"
    );
    assert_eq!(
        send(&mut session, "DOUBLEDOWN"),
        "ERROR cannot double down in current phase"
    );
}

#[test]
fn double_down_debits_the_extra_stake() {
    let deck = vec![
        card(Suit::Hearts, 5),
        card(Suit::Clubs, 10),
        card(Suit::Diamonds, 6),
        card(Suit::Spades, 7),
        card(Suit::Hearts, 10),
    ];
    let (mut session, vault, id) = logged_in(deck);

    send(&mut session, "BET 10");
    let reply = send(&mut session, "DOUBLE");
    assert!(reply.starts_with("OK Doubled down!\nBet: $20.00\n"), "{reply}");
    assert!(reply.contains("Result: You win!\nPayout: $40.00"));
    assert_eq!(vault.balance(id).unwrap(), STARTING_BALANCE + 2000);

    let stats = vault.stats(id).unwrap();
    assert_eq!(stats.total_bet, 2000);
    assert_eq!(stats.biggest_win, 2000);
}

#[test]
fn double_down_needs_funds_for_the_extra_stake() {
    let deck = vec![
        card(Suit::Hearts, 5),
        card(Suit::Clubs, 10),
        card(Suit::Diamonds, 6),
        card(Suit::Spades, 7),
        card(Suit::Hearts, 10),
    ];
    let (mut session, vault, id) = logged_in(deck);
    vault.set_balance(id, 1000, 0).unwrap();

    send(&mut session, "BET 10");
    assert_eq!(vault.balance(id).unwrap(), 0);
    assert_eq!(send(&mut session, "DOUBLEDOWN"), "ERROR insufficient funds");

    let game = session.game().unwrap();
    assert_eq!(game.phase(), GamePhase::PlayerTurn);
    assert_eq!(game.bet(), 1000);
    assert!(!game.is_doubled());
}

#[test]
fn double_down_after_hit_is_rejected_without_debit() {
    let deck = vec![
        card(Suit::Hearts, 2),
        card(Suit::Clubs, 10),
        card(Suit::Diamonds, 3),
        card(Suit::Spades, 7),
        card(Suit::Hearts, 4),
    ];
    let (mut session, vault, id) = logged_in(deck);

    send(&mut session, "BET 10");
    send(&mut session, "HIT");
    assert_eq!(
        send(&mut session, "DOUBLEDOWN"),
        "ERROR can only double down on initial hand"
    );
    assert_eq!(vault.balance(id).unwrap(), STARTING_BALANCE - 1000);
}

#[test]
fn double_down_on_empty_deck_refunds_extra_stake() {
    let deck = vec![
        card(Suit::Hearts, 5),
        card(Suit::Clubs, 10),
        card(Suit::Diamonds, 6),
        card(Suit::Spades, 7),
    ];
    let (mut session, vault, id) = logged_in(deck);

    send(&mut session, "BET 10");
    assert_eq!(send(&mut session, "DOUBLEDOWN"), "ERROR deck is empty");
    assert_eq!(vault.balance(id).unwrap(), STARTING_BALANCE - 1000);
    assert!(session.has_unfinished_game());
}

#[test]
fn surrender_returns_half_the_stake() {
    let (mut session, vault, id) = logged_in(fifteen_vs_sixteen());

    send(&mut session, "BET 25");
    let reply = send(&mut session, "SURRENDER");
    assert!(reply.starts_with("OK Surrendered!\n"));
    assert!(reply.contains("Result: Surrendered - half your bet returned.\nPayout: $12.50"));
    assert_eq!(vault.balance(id).unwrap(), STARTING_BALANCE - 1250);

    let stats = vault.stats(id).unwrap();
    assert_eq!(stats.games_lost, 1);
    assert_eq!(stats.total_won, 1250);
    assert_eq!(stats.biggest_loss, 1250);
}

#[test]
fn failed_deal_refunds_the_stake() {
    let deck = vec![
        card(Suit::Hearts, 5),
        card(Suit::Clubs, 10),
        card(Suit::Diamonds, 6),
    ];
    let (mut session, vault, id) = logged_in(deck);

    assert_eq!(
        send(&mut session, "BET 10"),
        "ERROR failed to deal: deck is empty"
    );
    assert_eq!(vault.balance(id).unwrap(), STARTING_BALANCE);
    assert!(session.game().is_none());
    assert_eq!(vault.stats(id).unwrap().games_played, 0);
}

#[test]
fn logout_and_login_wait_for_the_round() {
    let (mut session, _, _) = logged_in(nineteen_vs_seventeen());
    send(&mut session, "SIGNUP bob hunter22");

    send(&mut session, "BET 10");
    assert_eq!(
        send(&mut session, "LOGOUT"),
        "ERROR a game is already in progress"
    );
    assert_eq!(
        send(&mut session, "LOGIN bob hunter22"),
        "ERROR a game is already in progress"
    );
    assert_eq!(send(&mut session, "WHOAMI"), "OK Logged in as alice");

    send(&mut session, "STAND");
    assert_eq!(send(&mut session, "LOGOUT"), "OK Logged out.");
    assert!(!session.is_logged_in());
    assert!(session.game().is_none());
    assert_eq!(send(&mut session, "BALANCE"), "ERROR not logged in");
}

#[test]
fn expired_login_can_resume_the_round() {
    let (mut session, vault, id) = logged_in(nineteen_vs_seventeen());

    send(&mut session, "BET 100");
    assert_eq!(vault.purge_expired_sessions(i64::MAX).unwrap(), 1);
    assert_eq!(send(&mut session, "STAND"), "ERROR not logged in");
    assert!(session.has_unfinished_game());

    assert_eq!(
        send(&mut session, "LOGIN alice hunter22"),
        "OK Welcome, alice! Balance: $9900.00"
    );
    assert!(session.has_unfinished_game());

    let reply = send(&mut session, "STAND");
    assert!(reply.contains("Result: You win!\nPayout: $200.00"), "{reply}");
    assert_eq!(vault.balance(id).unwrap(), STARTING_BALANCE + 10_000);
    assert_eq!(vault.stats(id).unwrap().games_won, 1);
    assert_eq!(send(&mut session, "LOGOUT"), "OK Logged out.");
}

#[test]
fn relogin_after_finished_round_starts_clean() {
    let (mut session, _, _) = logged_in(nineteen_vs_seventeen());

    send(&mut session, "BET 10");
    send(&mut session, "STAND");
    assert!(session.game().is_some());

    assert!(send(&mut session, "LOGIN alice hunter22").starts_with("OK Welcome"));
    assert!(session.game().is_none());
}

#[test]
fn stats_report() {
    let (mut session, _, _) = logged_in(nineteen_vs_seventeen());

    send(&mut session, "BET 12.50");
    send(&mut session, "STAND");
    assert_eq!(
        send(&mut session, "STATS"),
        "OK Statistics for alice\nGames played: 1\nGames won: 1\nGames lost: 0\nTotal bet: $12.50\nTotal won: $25.00\nBiggest win: $12.50\nBiggest loss: $0.00"
    );
}

#[test]
fn balances_survive_reopening_the_database() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("casino.db");

    {
        let vault = Arc::new(Vault::open(&path, STARTING_BALANCE).unwrap());
        let mut session = casino_with(vault, nineteen_vs_seventeen());
        send(&mut session, "SIGNUP alice hunter22");
        send(&mut session, "LOGIN alice hunter22");
        send(&mut session, "BET 100");
        send(&mut session, "STAND");
    }

    let vault = Arc::new(Vault::open(&path, STARTING_BALANCE).unwrap());
    let account = vault.account_by_username(USER).unwrap();
    assert_eq!(account.balance, STARTING_BALANCE + 10_000);
    assert_eq!(vault.stats(account.id).unwrap().games_won, 1);

    let mut session = casino_with(vault, Vec::new());
    assert_eq!(
        send(&mut session, "LOGIN alice hunter22"),
        "OK Welcome, alice! Balance: $10100.00"
    );
}
