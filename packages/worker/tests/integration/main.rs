mod harness;
mod pipeline;
