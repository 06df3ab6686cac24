mod status;
mod timecode;
mod tracker;
