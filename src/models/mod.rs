// Model exports
//
// Expected schema (created and migrated outside this crate):
//
//   CREATE TABLE accounts (
//       id          UUID PRIMARY KEY DEFAULT gen_random_uuid(),
//       email       TEXT NOT NULL UNIQUE,
//       password    TEXT NOT NULL,
//       external_id TEXT NOT NULL UNIQUE,
//       name        TEXT NOT NULL,
//       birth_date  DATE NOT NULL,
//       city        TEXT NOT NULL,
//       about       TEXT,
//       liked       UUID[] NOT NULL DEFAULT '{}',
//       matched     UUID[] NOT NULL DEFAULT '{}',
//       created_at  TIMESTAMPTZ NOT NULL DEFAULT NOW()
//   );
//
//   CREATE TABLE posts (
//       id         UUID PRIMARY KEY DEFAULT gen_random_uuid(),
//       account_id UUID NOT NULL,
//       content    TEXT NOT NULL,
//       created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
//       CONSTRAINT posts_account_id_fkey
//           FOREIGN KEY (account_id) REFERENCES accounts (id) ON DELETE CASCADE
//   );
//
// The constraint names above are part of the contract: the error translator
// maps them back to table names (see core::error).
pub mod account;
pub mod page;
pub mod post;

pub use account::Account;
pub use page::{page_window, PageResult, PageSize};
pub use post::Post;
