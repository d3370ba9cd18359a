mod outbox;
mod photos;
mod records;
