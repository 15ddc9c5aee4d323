//! SQL schema for the ledgerview SQLite store.
//!
//! Executed once at connection startup. Table and column names are the
//! on-disk contract shared with existing data files, so they keep their
//! historical capitalisation.

/// Full schema DDL; idempotent thanks to `CREATE ... IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;

-- One row per transaction. Chain linkage (BlockHash, BlockNum, Height) is
-- set by the indexer and cleared by rollback; everything else is immutable.
CREATE TABLE IF NOT EXISTS Transactions (
    Type      INTEGER NOT NULL,
    Hash      TEXT    NOT NULL PRIMARY KEY,
    Time      INTEGER NOT NULL,   -- unix seconds
    BlockHash TEXT,
    BlockNum  INTEGER,
    Height    INTEGER,
    Last      INTEGER NOT NULL DEFAULT 0,
    Id        INTEGER,            -- short id, identity kinds only
    String1   TEXT,
    String2   TEXT,
    String3   TEXT,
    String4   TEXT,
    String5   TEXT,
    Int1      INTEGER
);

CREATE TABLE IF NOT EXISTS TxOutputs (
    TxHash      TEXT    NOT NULL,
    Number      INTEGER NOT NULL,
    AddressHash TEXT    NOT NULL,
    Value       INTEGER NOT NULL,
    TxHeight    INTEGER,
    SpentHeight INTEGER,
    SpentTxHash TEXT,
    PRIMARY KEY (TxHash, Number)
);

-- Append-only. Rows are never updated, only deleted by rollback.
CREATE TABLE IF NOT EXISTS Ratings (
    Type   INTEGER NOT NULL,
    Height INTEGER NOT NULL,
    Id     INTEGER NOT NULL,
    Value  INTEGER NOT NULL,
    PRIMARY KEY (Type, Id, Height, Value)
);

CREATE TABLE IF NOT EXISTS Utxo (
    TxId       TEXT    NOT NULL,
    Block      INTEGER NOT NULL,
    TxOut      INTEGER NOT NULL,
    TxTime     INTEGER NOT NULL,
    Address    TEXT    NOT NULL,
    BlockSpent INTEGER,
    Amount     INTEGER NOT NULL,
    PRIMARY KEY (TxId, TxOut)
);

CREATE INDEX IF NOT EXISTS Transactions_Height         ON Transactions (Height);
CREATE INDEX IF NOT EXISTS Transactions_Type_String1   ON Transactions (Type, String1, Height);
CREATE INDEX IF NOT EXISTS Transactions_Type_String2   ON Transactions (Type, String2, Height);
CREATE INDEX IF NOT EXISTS Transactions_Type_Id        ON Transactions (Type, Id);
CREATE INDEX IF NOT EXISTS TxOutputs_SpentHeight       ON TxOutputs (SpentHeight);
CREATE INDEX IF NOT EXISTS TxOutputs_TxHeight          ON TxOutputs (TxHeight);
CREATE INDEX IF NOT EXISTS TxOutputs_AddressHash       ON TxOutputs (AddressHash);
CREATE INDEX IF NOT EXISTS Ratings_Height              ON Ratings (Height);
CREATE INDEX IF NOT EXISTS Ratings_Type_Id_Value       ON Ratings (Type, Id, Value);
CREATE INDEX IF NOT EXISTS Utxo_Address                ON Utxo (Address, BlockSpent);
CREATE INDEX IF NOT EXISTS Utxo_Block                  ON Utxo (Block);
CREATE INDEX IF NOT EXISTS Utxo_BlockSpent             ON Utxo (BlockSpent);

PRAGMA user_version = 1;
";
