use std::collections::HashMap;

use serde::Serialize;
use sqlx::{FromRow, PgPool};

use crate::routes::user::DEFAULT_DISPLAY_NAME;

/// 排行榜最多返回的条目数
pub const LEADERBOARD_LIMIT: usize = 50;

#[derive(Debug, FromRow)]
pub struct UserVisitRow {
    pub user_id: Option<String>,
}

#[derive(Debug, FromRow)]
pub struct CountryVisitRow {
    pub country: Option<String>,
    pub country_code: Option<String>,
}

#[derive(Debug, PartialEq, Serialize)]
pub struct LeaderboardEntry {
    pub user_id: String,
    pub name: String,
    pub visit_count: i64,
}

#[derive(Debug, PartialEq, Serialize)]
pub struct CountryLeaderboardEntry {
    pub country_code: String,
    pub country: String,
    pub visit_count: i64,
}

// 国家桶，标签计数保持首次出现的顺序
struct CountryBucket {
    country_code: String,
    visit_count: i64,
    label_counts: Vec<(String, i64)>,
}

impl UserVisitRow {
    pub async fn fetch_all(pool: &PgPool) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, UserVisitRow>("SELECT user_id FROM visits")
            .fetch_all(pool)
            .await
    }
}

impl CountryVisitRow {
    pub async fn fetch_all(pool: &PgPool) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, CountryVisitRow>("SELECT country, country_code FROM visits")
            .fetch_all(pool)
            .await
    }
}

/// 按用户聚合打卡数。没有 user_id 的记录不参与统计，
/// 显示名查不到时用缺省名。名次先按打卡数降序，并列按用户ID升序
pub fn user_leaderboard(
    rows: &[UserVisitRow],
    names: &HashMap<String, String>,
) -> Vec<LeaderboardEntry> {
    let mut counts: HashMap<&str, i64> = HashMap::new();
    for row in rows {
        if let Some(user_id) = row.user_id.as_deref() {
            if user_id.is_empty() {
                continue;
            }
            *counts.entry(user_id).or_insert(0) += 1;
        }
    }

    let mut entries: Vec<LeaderboardEntry> = counts
        .into_iter()
        .map(|(user_id, visit_count)| LeaderboardEntry {
            user_id: user_id.to_string(),
            name: names
                .get(user_id)
                .cloned()
                .unwrap_or_else(|| DEFAULT_DISPLAY_NAME.to_string()),
            visit_count,
        })
        .collect();

    entries.sort_by(|a, b| {
        b.visit_count
            .cmp(&a.visit_count)
            .then_with(|| a.user_id.cmp(&b.user_id))
    });
    entries.truncate(LEADERBOARD_LIMIT);
    entries
}

/// 按国家代码聚合打卡数。没有 country_code 的记录整条跳过。
/// 显示标签取该桶里出现最多的国家名，次数相同取先出现的，
/// 一个都没有时退回大写的国家代码。并列名次按国家代码升序
pub fn country_leaderboard(rows: &[CountryVisitRow]) -> Vec<CountryLeaderboardEntry> {
    let mut buckets: Vec<CountryBucket> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for row in rows {
        let Some(code) = row
            .country_code
            .as_deref()
            .filter(|c| !c.is_empty())
            .map(|c| c.to_lowercase())
        else {
            continue;
        };

        let i = *index.entry(code.clone()).or_insert_with(|| {
            buckets.push(CountryBucket {
                country_code: code,
                visit_count: 0,
                label_counts: Vec::new(),
            });
            buckets.len() - 1
        });

        let bucket = &mut buckets[i];
        bucket.visit_count += 1;

        if let Some(label) = row.country.as_deref().filter(|c| !c.is_empty()) {
            match bucket.label_counts.iter_mut().find(|(l, _)| l == label) {
                Some((_, n)) => *n += 1,
                None => bucket.label_counts.push((label.to_string(), 1)),
            }
        }
    }

    let mut entries: Vec<CountryLeaderboardEntry> = buckets
        .into_iter()
        .map(|bucket| {
            let mut best_label: Option<&str> = None;
            let mut best_count = 0;
            for (label, n) in &bucket.label_counts {
                if *n > best_count {
                    best_count = *n;
                    best_label = Some(label);
                }
            }

            let country = best_label
                .map(str::to_string)
                .unwrap_or_else(|| bucket.country_code.to_uppercase());

            CountryLeaderboardEntry {
                country_code: bucket.country_code,
                country,
                visit_count: bucket.visit_count,
            }
        })
        .collect();

    entries.sort_by(|a, b| {
        b.visit_count
            .cmp(&a.visit_count)
            .then_with(|| a.country_code.cmp(&b.country_code))
    });
    entries.truncate(LEADERBOARD_LIMIT);
    entries
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user_rows(ids: &[Option<&str>]) -> Vec<UserVisitRow> {
        ids.iter()
            .map(|id| UserVisitRow {
                user_id: id.map(str::to_string),
            })
            .collect()
    }

    fn country_rows(rows: &[(Option<&str>, Option<&str>)]) -> Vec<CountryVisitRow> {
        rows.iter()
            .map(|(country, code)| CountryVisitRow {
                country: country.map(str::to_string),
                country_code: code.map(str::to_string),
            })
            .collect()
    }

    fn names(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(id, name)| (id.to_string(), name.to_string()))
            .collect()
    }

    #[test]
    fn counts_and_ranks_users() {
        let rows = user_rows(&[Some("A"), Some("A"), Some("B")]);
        let board = user_leaderboard(&rows, &names(&[("A", "Alice"), ("B", "Bob")]));

        assert_eq!(
            board,
            vec![
                LeaderboardEntry {
                    user_id: "A".into(),
                    name: "Alice".into(),
                    visit_count: 2,
                },
                LeaderboardEntry {
                    user_id: "B".into(),
                    name: "Bob".into(),
                    visit_count: 1,
                },
            ]
        );
    }

    #[test]
    fn missing_user_ids_are_excluded() {
        let rows = user_rows(&[Some("A"), None, Some(""), None]);
        let board = user_leaderboard(&rows, &HashMap::new());

        assert_eq!(board.len(), 1);
        assert_eq!(board[0].user_id, "A");
        assert_eq!(board[0].visit_count, 1);
    }

    #[test]
    fn unknown_users_get_default_name() {
        let rows = user_rows(&[Some("A")]);
        let board = user_leaderboard(&rows, &HashMap::new());

        assert_eq!(board[0].name, "Traveler");
    }

    #[test]
    fn equal_counts_order_by_user_id() {
        let rows = user_rows(&[Some("C"), Some("A"), Some("B")]);
        let board = user_leaderboard(&rows, &HashMap::new());

        let ids: Vec<&str> = board.iter().map(|e| e.user_id.as_str()).collect();
        assert_eq!(ids, vec!["A", "B", "C"]);
    }

    #[test]
    fn user_board_truncates_to_limit() {
        let ids: Vec<String> = (0..60).map(|i| format!("user-{:02}", i)).collect();
        let rows: Vec<UserVisitRow> = ids
            .iter()
            .map(|id| UserVisitRow {
                user_id: Some(id.clone()),
            })
            .collect();

        let board = user_leaderboard(&rows, &HashMap::new());
        assert_eq!(board.len(), LEADERBOARD_LIMIT);
    }

    #[test]
    fn counts_and_ranks_countries() {
        let rows = country_rows(&[
            (Some("France"), Some("fr")),
            (Some("France"), Some("fr")),
            (Some("USA"), Some("us")),
        ]);
        let board = country_leaderboard(&rows);

        assert_eq!(
            board,
            vec![
                CountryLeaderboardEntry {
                    country_code: "fr".into(),
                    country: "France".into(),
                    visit_count: 2,
                },
                CountryLeaderboardEntry {
                    country_code: "us".into(),
                    country: "USA".into(),
                    visit_count: 1,
                },
            ]
        );
    }

    #[test]
    fn missing_country_codes_are_excluded() {
        let rows = country_rows(&[
            (Some("France"), Some("fr")),
            (Some("Nowhere"), None),
            (None, Some("")),
        ]);
        let board = country_leaderboard(&rows);

        assert_eq!(board.len(), 1);
        assert_eq!(board[0].country_code, "fr");
        assert_eq!(board[0].visit_count, 1);
    }

    #[test]
    fn country_codes_are_lowercased_into_one_bucket() {
        let rows = country_rows(&[(Some("France"), Some("FR")), (Some("France"), Some("fr"))]);
        let board = country_leaderboard(&rows);

        assert_eq!(board.len(), 1);
        assert_eq!(board[0].country_code, "fr");
        assert_eq!(board[0].visit_count, 2);
    }

    #[test]
    fn most_frequent_label_wins() {
        let rows = country_rows(&[
            (Some("Germany"), Some("de")),
            (Some("Deutschland"), Some("de")),
            (Some("Deutschland"), Some("de")),
        ]);
        let board = country_leaderboard(&rows);

        assert_eq!(board[0].country, "Deutschland");
    }

    #[test]
    fn label_frequency_ties_keep_first_seen() {
        let rows = country_rows(&[
            (Some("Germany"), Some("de")),
            (Some("Deutschland"), Some("de")),
        ]);
        let board = country_leaderboard(&rows);

        assert_eq!(board[0].country, "Germany");
    }

    #[test]
    fn label_falls_back_to_uppercased_code() {
        let rows = country_rows(&[(None, Some("fr")), (None, Some("fr"))]);
        let board = country_leaderboard(&rows);

        assert_eq!(board[0].country, "FR");
        assert_eq!(board[0].visit_count, 2);
    }

    #[test]
    fn country_board_truncates_to_limit() {
        let codes: Vec<String> = (0..55).map(|i| format!("c{:02}", i)).collect();
        let rows: Vec<CountryVisitRow> = codes
            .iter()
            .map(|c| CountryVisitRow {
                country: None,
                country_code: Some(c.clone()),
            })
            .collect();

        let board = country_leaderboard(&rows);
        assert_eq!(board.len(), LEADERBOARD_LIMIT);
    }
}
