pub(crate) use docsis_core::clock::now_unix;
