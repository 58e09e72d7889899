use crate::Database;
use crate::models::{
    CommentRow, NewNotification, NotificationRow, PostRow, ProfileStats, ReportRow, TargetRef,
    UserRow,
};
use anyhow::Result;
use rusqlite::Connection;

/// Append a notification inside the caller's transaction. The row commits
/// atomically with whatever action triggered it; this function never commits
/// on its own.
pub fn insert_notification(conn: &Connection, n: &NewNotification<'_>) -> Result<()> {
    conn.execute(
        "INSERT INTO notifications (id, user_id, kind, payload) VALUES (?1, ?2, ?3, ?4)",
        rusqlite::params![n.id, n.user_id, n.kind, n.payload],
    )?;
    Ok(())
}

impl Database {
    // -- Users --

    pub fn create_user(&self, id: &str, username: &str, password_hash: &str) -> Result<()> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO users (id, username, password) VALUES (?1, ?2, ?3)",
                (id, username, password_hash),
            )?;
            Ok(())
        })
    }

    pub fn get_user_by_username(&self, username: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user(conn, "username", username))
    }

    pub fn get_user_by_id(&self, id: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user(conn, "id", id))
    }

    // -- Posts & comments --

    pub fn create_post(&self, id: &str, author_id: &str, title: &str, content: &str) -> Result<()> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO posts (id, author_id, title, content) VALUES (?1, ?2, ?3, ?4)",
                rusqlite::params![id, author_id, title, content],
            )?;
            Ok(())
        })
    }

    pub fn get_post(&self, id: &str) -> Result<Option<PostRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!("{POST_SELECT} WHERE p.id = ?1"))?;
            let row = stmt.query_row([id], post_from_row).optional()?;
            Ok(row)
        })
    }

    pub fn list_posts(&self, limit: u32, offset: u32) -> Result<Vec<PostRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "{POST_SELECT} ORDER BY p.created_at DESC LIMIT ?1 OFFSET ?2"
            ))?;
            let rows = stmt
                .query_map(rusqlite::params![limit, offset], post_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Insert a comment, optionally appending a notification for the post
    /// author in the same transaction.
    pub fn create_comment(
        &self,
        id: &str,
        post_id: &str,
        author_id: &str,
        content: &str,
        notify: Option<NewNotification<'_>>,
    ) -> Result<()> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            tx.execute(
                "INSERT INTO comments (id, post_id, author_id, content) VALUES (?1, ?2, ?3, ?4)",
                rusqlite::params![id, post_id, author_id, content],
            )?;
            if let Some(n) = notify {
                insert_notification(&tx, &n)?;
            }
            tx.commit()?;
            Ok(())
        })
    }

    pub fn list_comments(&self, post_id: &str) -> Result<Vec<CommentRow>> {
        self.with_conn(|conn| {
            // JOIN users to fetch author_username in a single query
            let mut stmt = conn.prepare(
                "SELECT c.id, c.post_id, c.author_id, u.username, c.content, c.created_at,
                        COALESCE((SELECT SUM(v.value) FROM votes v WHERE v.comment_id = c.id), 0)
                 FROM comments c
                 LEFT JOIN users u ON c.author_id = u.id
                 WHERE c.post_id = ?1
                 ORDER BY c.created_at ASC",
            )?;
            let rows = stmt
                .query_map([post_id], |row| {
                    Ok(CommentRow {
                        id: row.get(0)?,
                        post_id: row.get(1)?,
                        author_id: row.get(2)?,
                        author_username: row
                            .get::<_, Option<String>>(3)?
                            .unwrap_or_else(|| "unknown".to_string()),
                        content: row.get(4)?,
                        created_at: row.get(5)?,
                        score: row.get(6)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    // -- Votes --

    /// Author of the target row, or None when the target does not exist.
    pub fn target_author(&self, target: TargetRef<'_>) -> Result<Option<String>> {
        self.with_conn(|conn| {
            let row = conn
                .query_row(
                    &format!("SELECT author_id FROM {} WHERE id = ?1", target.table()),
                    [target.id()],
                    |row| row.get(0),
                )
                .optional()?;
            Ok(row)
        })
    }

    /// Tri-state vote toggle, atomic in one transaction: no existing vote
    /// inserts, same sign deletes (un-vote), opposite sign updates (switch).
    /// Returns (resulting value with 0 = no vote, new aggregate score).
    pub fn cast_vote(
        &self,
        id: &str,
        user_id: &str,
        target: TargetRef<'_>,
        value: i64,
    ) -> Result<(i64, i64)> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            let col = target.column();

            let existing: Option<(String, i64)> = tx
                .query_row(
                    &format!("SELECT id, value FROM votes WHERE user_id = ?1 AND {col} = ?2"),
                    rusqlite::params![user_id, target.id()],
                    |row| Ok((row.get(0)?, row.get(1)?)),
                )
                .optional()?;

            let resulting = match existing {
                None => {
                    tx.execute(
                        &format!(
                            "INSERT INTO votes (id, user_id, {col}, value) VALUES (?1, ?2, ?3, ?4)"
                        ),
                        rusqlite::params![id, user_id, target.id(), value],
                    )?;
                    value
                }
                Some((vote_id, current)) if current == value => {
                    tx.execute("DELETE FROM votes WHERE id = ?1", [&vote_id])?;
                    0
                }
                Some((vote_id, _)) => {
                    tx.execute(
                        "UPDATE votes SET value = ?1 WHERE id = ?2",
                        rusqlite::params![value, vote_id],
                    )?;
                    value
                }
            };

            let score: i64 = tx.query_row(
                &format!("SELECT COALESCE(SUM(value), 0) FROM votes WHERE {col} = ?1"),
                [target.id()],
                |row| row.get(0),
            )?;

            tx.commit()?;
            Ok((resulting, score))
        })
    }

    pub fn target_score(&self, target: TargetRef<'_>) -> Result<i64> {
        self.with_conn(|conn| {
            let score = conn.query_row(
                &format!(
                    "SELECT COALESCE(SUM(value), 0) FROM votes WHERE {} = ?1",
                    target.column()
                ),
                [target.id()],
                |row| row.get(0),
            )?;
            Ok(score)
        })
    }

    // -- Notifications --

    pub fn get_notification(&self, id: &str) -> Result<Option<NotificationRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!("{NOTIFICATION_SELECT} WHERE id = ?1"))?;
            let row = stmt.query_row([id], notification_from_row).optional()?;
            Ok(row)
        })
    }

    pub fn list_notifications(
        &self,
        user_id: &str,
        limit: u32,
        offset: u32,
    ) -> Result<Vec<NotificationRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "{NOTIFICATION_SELECT} WHERE user_id = ?1
                 ORDER BY created_at DESC LIMIT ?2 OFFSET ?3"
            ))?;
            let rows = stmt
                .query_map(rusqlite::params![user_id, limit, offset], notification_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn mark_notification_read(&self, id: &str) -> Result<()> {
        self.with_conn_mut(|conn| {
            conn.execute("UPDATE notifications SET is_read = 1 WHERE id = ?1", [id])?;
            Ok(())
        })
    }

    /// Returns how many rows flipped to read.
    pub fn mark_all_notifications_read(&self, user_id: &str) -> Result<usize> {
        self.with_conn_mut(|conn| {
            let changed = conn.execute(
                "UPDATE notifications SET is_read = 1 WHERE user_id = ?1 AND is_read = 0",
                [user_id],
            )?;
            Ok(changed)
        })
    }

    pub fn unread_notification_count(&self, user_id: &str) -> Result<i64> {
        self.with_conn(|conn| {
            let count = conn.query_row(
                "SELECT COUNT(*) FROM notifications WHERE user_id = ?1 AND is_read = 0",
                [user_id],
                |row| row.get(0),
            )?;
            Ok(count)
        })
    }

    // -- Reports --

    /// Insert a pending report. Returns false when this reporter already has
    /// a report against the same target (rejected by the unique constraint).
    pub fn file_report(
        &self,
        id: &str,
        reporter_id: &str,
        target: TargetRef<'_>,
        reason: &str,
    ) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let res = conn.execute(
                &format!(
                    "INSERT INTO reports (id, reporter_id, {}, reason) VALUES (?1, ?2, ?3, ?4)",
                    target.column()
                ),
                rusqlite::params![id, reporter_id, target.id(), reason],
            );
            match res {
                Ok(_) => Ok(true),
                Err(rusqlite::Error::SqliteFailure(e, _))
                    if e.code == rusqlite::ErrorCode::ConstraintViolation =>
                {
                    Ok(false)
                }
                Err(e) => Err(e.into()),
            }
        })
    }

    pub fn get_report(&self, id: &str) -> Result<Option<ReportRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!("{REPORT_SELECT} WHERE r.id = ?1"))?;
            let row = stmt.query_row([id], report_from_row).optional()?;
            Ok(row)
        })
    }

    /// Pending reports, oldest first, for FIFO triage.
    pub fn list_pending_reports(&self, limit: u32, offset: u32) -> Result<Vec<ReportRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "{REPORT_SELECT} WHERE r.status = 'pending'
                 ORDER BY r.created_at ASC LIMIT ?1 OFFSET ?2"
            ))?;
            let rows = stmt
                .query_map(rusqlite::params![limit, offset], report_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn pending_report_count(&self) -> Result<i64> {
        self.with_conn(|conn| {
            let count = conn.query_row(
                "SELECT COUNT(*) FROM reports WHERE status = 'pending'",
                [],
                |row| row.get(0),
            )?;
            Ok(count)
        })
    }

    /// Overwrites status and notes unconditionally; there is no state-machine
    /// guard, an admin may move a reviewed report back to pending.
    /// Returns false when the report does not exist.
    pub fn update_report_status(
        &self,
        id: &str,
        status: &str,
        admin_notes: Option<&str>,
    ) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let changed = conn.execute(
                "UPDATE reports SET status = ?1, admin_notes = ?2 WHERE id = ?3",
                rusqlite::params![status, admin_notes, id],
            )?;
            Ok(changed == 1)
        })
    }

    // -- Follows --

    /// Returns true when the follow edge was newly created. The notification,
    /// if any, is only appended for a new edge and commits with it.
    pub fn follow_user(
        &self,
        follower_id: &str,
        followed_id: &str,
        notify: Option<NewNotification<'_>>,
    ) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            let inserted = tx.execute(
                "INSERT OR IGNORE INTO follows (follower_id, followed_id) VALUES (?1, ?2)",
                rusqlite::params![follower_id, followed_id],
            )?;
            if inserted == 1 {
                if let Some(n) = notify {
                    insert_notification(&tx, &n)?;
                }
            }
            tx.commit()?;
            Ok(inserted == 1)
        })
    }

    pub fn unfollow_user(&self, follower_id: &str, followed_id: &str) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let removed = conn.execute(
                "DELETE FROM follows WHERE follower_id = ?1 AND followed_id = ?2",
                rusqlite::params![follower_id, followed_id],
            )?;
            Ok(removed == 1)
        })
    }

    pub fn profile_stats(&self, user_id: &str) -> Result<ProfileStats> {
        self.with_conn(|conn| {
            let followers = conn.query_row(
                "SELECT COUNT(*) FROM follows WHERE followed_id = ?1",
                [user_id],
                |row| row.get(0),
            )?;
            let following = conn.query_row(
                "SELECT COUNT(*) FROM follows WHERE follower_id = ?1",
                [user_id],
                |row| row.get(0),
            )?;
            let posts = conn.query_row(
                "SELECT COUNT(*) FROM posts WHERE author_id = ?1",
                [user_id],
                |row| row.get(0),
            )?;
            Ok(ProfileStats {
                followers,
                following,
                posts,
            })
        })
    }
}

const POST_SELECT: &str = "SELECT p.id, p.author_id, u.username, p.title, p.content, p.created_at,
        COALESCE((SELECT SUM(v.value) FROM votes v WHERE v.post_id = p.id), 0),
        (SELECT COUNT(*) FROM comments c WHERE c.post_id = p.id)
 FROM posts p
 LEFT JOIN users u ON p.author_id = u.id";

fn post_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<PostRow> {
    Ok(PostRow {
        id: row.get(0)?,
        author_id: row.get(1)?,
        author_username: row
            .get::<_, Option<String>>(2)?
            .unwrap_or_else(|| "unknown".to_string()),
        title: row.get(3)?,
        content: row.get(4)?,
        created_at: row.get(5)?,
        score: row.get(6)?,
        comment_count: row.get(7)?,
    })
}

const NOTIFICATION_SELECT: &str =
    "SELECT id, user_id, kind, payload, created_at, is_read FROM notifications";

fn notification_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<NotificationRow> {
    Ok(NotificationRow {
        id: row.get(0)?,
        user_id: row.get(1)?,
        kind: row.get(2)?,
        payload: row.get(3)?,
        created_at: row.get(4)?,
        is_read: row.get(5)?,
    })
}

const REPORT_SELECT: &str =
    "SELECT r.id, r.reporter_id, u.username, r.post_id, r.comment_id, r.reason, r.status,
        r.admin_notes, r.created_at
 FROM reports r
 LEFT JOIN users u ON r.reporter_id = u.id";

fn report_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<ReportRow> {
    Ok(ReportRow {
        id: row.get(0)?,
        reporter_id: row.get(1)?,
        reporter_username: row
            .get::<_, Option<String>>(2)?
            .unwrap_or_else(|| "unknown".to_string()),
        post_id: row.get(3)?,
        comment_id: row.get(4)?,
        reason: row.get(5)?,
        status: row.get(6)?,
        admin_notes: row.get(7)?,
        created_at: row.get(8)?,
    })
}

fn query_user(conn: &Connection, column: &str, value: &str) -> Result<Option<UserRow>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT id, username, password, role, created_at FROM users WHERE {column} = ?1"
    ))?;

    let row = stmt
        .query_row([value], |row| {
            Ok(UserRow {
                id: row.get(0)?,
                username: row.get(1)?,
                password: row.get(2)?,
                role: row.get(3)?,
                created_at: row.get(4)?,
            })
        })
        .optional()?;

    Ok(row)
}

/// Extension trait for optional query results
trait OptionalExt<T> {
    fn optional(self) -> Result<Option<T>>;
}

impl<T> OptionalExt<T> for std::result::Result<T, rusqlite::Error> {
    fn optional(self) -> Result<Option<T>> {
        match self {
            Ok(val) => Ok(Some(val)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn db() -> Database {
        Database::open_in_memory().unwrap()
    }

    fn user(db: &Database, name: &str) -> String {
        let id = Uuid::new_v4().to_string();
        db.create_user(&id, name, "hash").unwrap();
        id
    }

    fn post(db: &Database, author: &str) -> String {
        let id = Uuid::new_v4().to_string();
        db.create_post(&id, author, "title", "content").unwrap();
        id
    }

    fn comment(db: &Database, post_id: &str, author: &str) -> String {
        let id = Uuid::new_v4().to_string();
        db.create_comment(&id, post_id, author, "a comment", None)
            .unwrap();
        id
    }

    fn vote_rows(db: &Database) -> i64 {
        db.with_conn(|conn| {
            let n = conn.query_row("SELECT COUNT(*) FROM votes", [], |row| row.get(0))?;
            Ok(n)
        })
        .unwrap()
    }

    fn cast(db: &Database, user_id: &str, target: TargetRef<'_>, value: i64) -> (i64, i64) {
        db.cast_vote(&Uuid::new_v4().to_string(), user_id, target, value)
            .unwrap()
    }

    #[test]
    fn same_direction_vote_toggles_off() {
        let db = db();
        let alice = user(&db, "alice");
        let post_id = post(&db, &alice);
        let target = TargetRef::Post(&post_id);

        assert_eq!(cast(&db, &alice, target, 1), (1, 1));
        assert_eq!(cast(&db, &alice, target, 1), (0, 0));
        assert_eq!(vote_rows(&db), 0);
    }

    #[test]
    fn opposite_direction_switches_vote() {
        let db = db();
        let alice = user(&db, "alice");
        let post_id = post(&db, &alice);
        let target = TargetRef::Post(&post_id);

        assert_eq!(cast(&db, &alice, target, 1), (1, 1));
        assert_eq!(cast(&db, &alice, target, -1), (-1, -1));
        assert_eq!(vote_rows(&db), 1);
    }

    #[test]
    fn score_sums_votes_across_users() {
        let db = db();
        let author = user(&db, "author");
        let post_id = post(&db, &author);
        let target = TargetRef::Post(&post_id);

        for name in ["u1", "u2", "u3"] {
            cast(&db, &user(&db, name), target, 1);
        }
        for name in ["d1", "d2"] {
            cast(&db, &user(&db, name), target, -1);
        }

        assert_eq!(db.target_score(target).unwrap(), 1);
    }

    #[test]
    fn vote_sequence_walkthrough() {
        let db = db();
        let a = user(&db, "a");
        let b = user(&db, "b");
        let post_id = post(&db, &a);
        let target = TargetRef::Post(&post_id);

        assert_eq!(cast(&db, &a, target, 1), (1, 1));
        assert_eq!(cast(&db, &b, target, -1), (-1, 0));
        // A switches to a downvote, B's downvote still counts
        assert_eq!(cast(&db, &a, target, -1), (-1, -2));
        // A toggles the downvote off
        assert_eq!(cast(&db, &a, target, -1), (0, -1));
    }

    #[test]
    fn post_and_comment_votes_are_independent() {
        let db = db();
        let alice = user(&db, "alice");
        let post_id = post(&db, &alice);
        let comment_id = comment(&db, &post_id, &alice);

        cast(&db, &alice, TargetRef::Post(&post_id), 1);
        cast(&db, &alice, TargetRef::Comment(&comment_id), -1);

        assert_eq!(db.target_score(TargetRef::Post(&post_id)).unwrap(), 1);
        assert_eq!(db.target_score(TargetRef::Comment(&comment_id)).unwrap(), -1);
        assert_eq!(vote_rows(&db), 2);
    }

    #[test]
    fn missing_target_has_no_author() {
        let db = db();
        let ghost = Uuid::new_v4().to_string();
        assert!(db.target_author(TargetRef::Post(&ghost)).unwrap().is_none());
        assert!(db.target_author(TargetRef::Comment(&ghost)).unwrap().is_none());
    }

    #[test]
    fn comment_notification_commits_with_comment() {
        let db = db();
        let author = user(&db, "author");
        let commenter = user(&db, "commenter");
        let post_id = post(&db, &author);

        let notif_id = Uuid::new_v4().to_string();
        let payload = serde_json::json!({
            "kind": "new_comment_on_post",
            "post_id": post_id,
        })
        .to_string();
        db.create_comment(
            &Uuid::new_v4().to_string(),
            &post_id,
            &commenter,
            "nice post",
            Some(NewNotification {
                id: &notif_id,
                user_id: &author,
                kind: "new_comment_on_post",
                payload: &payload,
            }),
        )
        .unwrap();

        assert_eq!(db.unread_notification_count(&author).unwrap(), 1);
        let rows = db.list_notifications(&author, 50, 0).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].kind, "new_comment_on_post");
        assert!(!rows[0].is_read);
    }

    #[test]
    fn mark_read_transitions_stick() {
        let db = db();
        let alice = user(&db, "alice");
        let notif_id = Uuid::new_v4().to_string();
        db.with_conn_mut(|conn| {
            insert_notification(
                conn,
                &NewNotification {
                    id: &notif_id,
                    user_id: &alice,
                    kind: "new_follower",
                    payload: "{}",
                },
            )
        })
        .unwrap();

        db.mark_notification_read(&notif_id).unwrap();
        assert!(db.get_notification(&notif_id).unwrap().unwrap().is_read);

        // A second mark is a no-op, never a flip back
        db.mark_notification_read(&notif_id).unwrap();
        assert!(db.get_notification(&notif_id).unwrap().unwrap().is_read);
        assert_eq!(db.unread_notification_count(&alice).unwrap(), 0);
    }

    #[test]
    fn mark_all_flips_only_unread_rows() {
        let db = db();
        let alice = user(&db, "alice");
        for _ in 0..3 {
            let id = Uuid::new_v4().to_string();
            db.with_conn_mut(|conn| {
                insert_notification(
                    conn,
                    &NewNotification {
                        id: &id,
                        user_id: &alice,
                        kind: "new_follower",
                        payload: "{}",
                    },
                )
            })
            .unwrap();
        }

        assert_eq!(db.mark_all_notifications_read(&alice).unwrap(), 3);
        assert_eq!(db.mark_all_notifications_read(&alice).unwrap(), 0);
        assert_eq!(db.unread_notification_count(&alice).unwrap(), 0);
    }

    #[test]
    fn duplicate_report_rejected_by_constraint() {
        let db = db();
        let author = user(&db, "author");
        let reporter = user(&db, "reporter");
        let post_id = post(&db, &author);
        let target = TargetRef::Post(&post_id);

        assert!(db
            .file_report(&Uuid::new_v4().to_string(), &reporter, target, "spam")
            .unwrap());
        assert!(!db
            .file_report(&Uuid::new_v4().to_string(), &reporter, target, "spam again")
            .unwrap());
        assert_eq!(db.pending_report_count().unwrap(), 1);

        // A different reporter is still allowed
        let other = user(&db, "other");
        assert!(db
            .file_report(&Uuid::new_v4().to_string(), &other, target, "me too")
            .unwrap());
        assert_eq!(db.pending_report_count().unwrap(), 2);
    }

    #[test]
    fn same_reporter_may_report_post_and_its_comment() {
        let db = db();
        let author = user(&db, "author");
        let reporter = user(&db, "reporter");
        let post_id = post(&db, &author);
        let comment_id = comment(&db, &post_id, &author);

        assert!(db
            .file_report(
                &Uuid::new_v4().to_string(),
                &reporter,
                TargetRef::Post(&post_id),
                "spam"
            )
            .unwrap());
        assert!(db
            .file_report(
                &Uuid::new_v4().to_string(),
                &reporter,
                TargetRef::Comment(&comment_id),
                "also spam"
            )
            .unwrap());
        assert_eq!(db.pending_report_count().unwrap(), 2);
    }

    #[test]
    fn reviewed_report_leaves_pending_queue() {
        let db = db();
        let author = user(&db, "author");
        let reporter = user(&db, "reporter");
        let post_id = post(&db, &author);
        let report_id = Uuid::new_v4().to_string();
        db.file_report(&report_id, &reporter, TargetRef::Post(&post_id), "spam")
            .unwrap();

        assert!(db
            .update_report_status(&report_id, "reviewed_action_taken", Some("removed the post"))
            .unwrap());

        assert_eq!(db.pending_report_count().unwrap(), 0);
        assert!(db.list_pending_reports(50, 0).unwrap().is_empty());

        let report = db.get_report(&report_id).unwrap().unwrap();
        assert_eq!(report.status, "reviewed_action_taken");
        assert_eq!(report.admin_notes.as_deref(), Some("removed the post"));

        // No guard against regressing a reviewed report
        assert!(db.update_report_status(&report_id, "pending", None).unwrap());
        assert_eq!(db.pending_report_count().unwrap(), 1);

        let ghost = Uuid::new_v4().to_string();
        assert!(!db.update_report_status(&ghost, "pending", None).unwrap());
    }

    #[test]
    fn pending_reports_listed_oldest_first() {
        let db = db();
        let author = user(&db, "author");
        let post_id = post(&db, &author);

        let first = Uuid::new_v4().to_string();
        let second = Uuid::new_v4().to_string();
        db.file_report(&first, &user(&db, "r1"), TargetRef::Post(&post_id), "one")
            .unwrap();
        db.file_report(&second, &user(&db, "r2"), TargetRef::Post(&post_id), "two")
            .unwrap();

        // datetime('now') has second resolution; backdate the first report so
        // the ordering is deterministic.
        db.with_conn_mut(|conn| {
            conn.execute(
                "UPDATE reports SET created_at = datetime('now', '-1 hour') WHERE id = ?1",
                [&first],
            )?;
            Ok(())
        })
        .unwrap();

        let pending = db.list_pending_reports(50, 0).unwrap();
        assert_eq!(pending.len(), 2);
        assert_eq!(pending[0].id, first);
        assert_eq!(pending[1].id, second);
    }

    #[test]
    fn follow_is_idempotent_and_notifies_once() {
        let db = db();
        let follower = user(&db, "follower");
        let followed = user(&db, "followed");

        let n1 = Uuid::new_v4().to_string();
        assert!(db
            .follow_user(
                &follower,
                &followed,
                Some(NewNotification {
                    id: &n1,
                    user_id: &followed,
                    kind: "new_follower",
                    payload: "{}",
                })
            )
            .unwrap());

        let n2 = Uuid::new_v4().to_string();
        assert!(!db
            .follow_user(
                &follower,
                &followed,
                Some(NewNotification {
                    id: &n2,
                    user_id: &followed,
                    kind: "new_follower",
                    payload: "{}",
                })
            )
            .unwrap());

        assert_eq!(db.unread_notification_count(&followed).unwrap(), 1);

        assert!(db.unfollow_user(&follower, &followed).unwrap());
        assert!(!db.unfollow_user(&follower, &followed).unwrap());
    }

    #[test]
    fn profile_stats_count_edges_and_posts() {
        let db = db();
        let alice = user(&db, "alice");
        let bob = user(&db, "bob");
        let carol = user(&db, "carol");

        db.follow_user(&bob, &alice, None).unwrap();
        db.follow_user(&carol, &alice, None).unwrap();
        db.follow_user(&alice, &bob, None).unwrap();
        post(&db, &alice);
        post(&db, &alice);

        let stats = db.profile_stats(&alice).unwrap();
        assert_eq!(stats.followers, 2);
        assert_eq!(stats.following, 1);
        assert_eq!(stats.posts, 2);
    }

    #[test]
    fn post_listing_carries_scores_and_comment_counts() {
        let db = db();
        let alice = user(&db, "alice");
        let bob = user(&db, "bob");
        let post_id = post(&db, &alice);
        comment(&db, &post_id, &bob);
        comment(&db, &post_id, &alice);
        cast(&db, &bob, TargetRef::Post(&post_id), 1);

        let fetched = db.get_post(&post_id).unwrap().unwrap();
        assert_eq!(fetched.score, 1);
        assert_eq!(fetched.comment_count, 2);
        assert_eq!(fetched.author_username, "alice");

        let listed = db.list_posts(10, 0).unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, post_id);
    }

    #[test]
    fn username_lookup() {
        let db = db();
        let id = user(&db, "alice");
        let row = db.get_user_by_username("alice").unwrap().unwrap();
        assert_eq!(row.id, id);
        assert_eq!(row.role, "student");
        assert!(db.get_user_by_username("nobody").unwrap().is_none());
    }
}
