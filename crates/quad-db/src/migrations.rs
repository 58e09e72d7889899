use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS users (
            id          TEXT PRIMARY KEY,
            username    TEXT NOT NULL UNIQUE,
            password    TEXT NOT NULL,
            role        TEXT NOT NULL DEFAULT 'student',
            created_at  TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS posts (
            id          TEXT PRIMARY KEY,
            author_id   TEXT NOT NULL REFERENCES users(id),
            title       TEXT NOT NULL,
            content     TEXT NOT NULL,
            created_at  TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX IF NOT EXISTS idx_posts_created
            ON posts(created_at);

        CREATE TABLE IF NOT EXISTS comments (
            id          TEXT PRIMARY KEY,
            post_id     TEXT NOT NULL REFERENCES posts(id) ON DELETE CASCADE,
            author_id   TEXT NOT NULL REFERENCES users(id),
            content     TEXT NOT NULL,
            created_at  TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX IF NOT EXISTS idx_comments_post
            ON comments(post_id, created_at);

        -- One signed vote per (user, target). A vote points at exactly one of
        -- post_id/comment_id; SQLite treats NULLs as distinct in UNIQUE, so
        -- the pair constraints only bite within each target kind.
        CREATE TABLE IF NOT EXISTS votes (
            id          TEXT PRIMARY KEY,
            user_id     TEXT NOT NULL REFERENCES users(id),
            post_id     TEXT REFERENCES posts(id) ON DELETE CASCADE,
            comment_id  TEXT REFERENCES comments(id) ON DELETE CASCADE,
            value       INTEGER NOT NULL CHECK (value IN (1, -1)),
            created_at  TEXT NOT NULL DEFAULT (datetime('now')),
            CHECK ((post_id IS NOT NULL AND comment_id IS NULL)
                OR (post_id IS NULL AND comment_id IS NOT NULL)),
            UNIQUE(user_id, post_id),
            UNIQUE(user_id, comment_id)
        );

        CREATE INDEX IF NOT EXISTS idx_votes_post
            ON votes(post_id);
        CREATE INDEX IF NOT EXISTS idx_votes_comment
            ON votes(comment_id);

        CREATE TABLE IF NOT EXISTS notifications (
            id          TEXT PRIMARY KEY,
            user_id     TEXT NOT NULL REFERENCES users(id),
            kind        TEXT NOT NULL,
            payload     TEXT NOT NULL,
            created_at  TEXT NOT NULL DEFAULT (datetime('now')),
            is_read     INTEGER NOT NULL DEFAULT 0
        );

        CREATE INDEX IF NOT EXISTS idx_notifications_user
            ON notifications(user_id, created_at);

        -- Duplicate reports are rejected by the store, not by an advisory
        -- read-then-write check in the handlers.
        CREATE TABLE IF NOT EXISTS reports (
            id          TEXT PRIMARY KEY,
            reporter_id TEXT NOT NULL REFERENCES users(id),
            post_id     TEXT REFERENCES posts(id) ON DELETE CASCADE,
            comment_id  TEXT REFERENCES comments(id) ON DELETE CASCADE,
            reason      TEXT NOT NULL,
            status      TEXT NOT NULL DEFAULT 'pending',
            admin_notes TEXT,
            created_at  TEXT NOT NULL DEFAULT (datetime('now')),
            CHECK ((post_id IS NOT NULL AND comment_id IS NULL)
                OR (post_id IS NULL AND comment_id IS NOT NULL)),
            UNIQUE(reporter_id, post_id),
            UNIQUE(reporter_id, comment_id)
        );

        CREATE INDEX IF NOT EXISTS idx_reports_status
            ON reports(status, created_at);

        CREATE TABLE IF NOT EXISTS follows (
            follower_id TEXT NOT NULL REFERENCES users(id),
            followed_id TEXT NOT NULL REFERENCES users(id),
            created_at  TEXT NOT NULL DEFAULT (datetime('now')),
            PRIMARY KEY (follower_id, followed_id)
        );
        ",
    )?;

    info!("Database migrations complete");
    Ok(())
}
